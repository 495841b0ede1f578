use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::directory::Credential;
use crate::error::{MirrorError, Result};

/// Version-control operations a mirror run needs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Clone every branch of `remote_url` into `local_path`
    async fn clone_repository(
        &self,
        remote_url: &str,
        local_path: &Path,
        credential: &Credential,
    ) -> Result<()>;

    /// Local branch names of a clone, sorted by name
    async fn list_local_branches(&self, local_path: &Path) -> Result<Vec<String>>;

    /// Point `remote_name` at `remote_url`, replacing an existing binding
    async fn add_or_replace_remote(
        &self,
        local_path: &Path,
        remote_name: &str,
        remote_url: &str,
    ) -> Result<()>;

    /// Push one local branch to the same branch name on `remote_name`
    async fn push_branch(
        &self,
        local_path: &Path,
        remote_name: &str,
        branch: &str,
        credential: &Credential,
    ) -> Result<()>;
}

/// [`VcsClient`] backed by the `git` binary
///
/// Clones are bare, so every branch of the source remote becomes a local
/// branch (`refs/heads/*`) without checking out a working tree. Credentials
/// are handed to git through `GIT_CONFIG_*` environment variables as an
/// `http.extraHeader`, which keeps tokens out of the process arguments and
/// out of `.git/config`.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    /// Run git, returning stdout on success and trimmed stderr on failure
    async fn run(
        &self,
        args: &[&str],
        cwd: Option<&Path>,
        credential: Option<&Credential>,
    ) -> std::result::Result<String, String> {
        let mut command = AsyncCommand::new("git");
        command.args(args).env("GIT_TERMINAL_PROMPT", "0");

        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        if let Some(credential) = credential {
            command
                .env("GIT_CONFIG_COUNT", "1")
                .env("GIT_CONFIG_KEY_0", "http.extraHeader")
                .env(
                    "GIT_CONFIG_VALUE_0",
                    format!("Authorization: {}", credential.basic_auth_header()),
                );
        }

        debug!("git {}", args.join(" "));

        let output = command
            .output()
            .await
            .map_err(|e| format!("Failed to execute git: {}", e))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }

    fn remote_error(local_path: &Path, message: String) -> MirrorError {
        MirrorError::Remote {
            path: local_path.to_path_buf(),
            message,
        }
    }
}

/// Name used for a clone in error messages when the caller has none
fn repository_label(local_path: &Path) -> String {
    local_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| local_path.display().to_string())
}

#[async_trait]
impl VcsClient for GitCli {
    async fn clone_repository(
        &self,
        remote_url: &str,
        local_path: &Path,
        credential: &Credential,
    ) -> Result<()> {
        let target = local_path.to_string_lossy();

        self.run(
            &["clone", "--bare", "--quiet", "--", remote_url, target.as_ref()],
            None,
            Some(credential),
        )
        .await
        .map_err(|message| MirrorError::Clone {
            repository: repository_label(local_path),
            url: remote_url.to_string(),
            message: format!("Git clone failed: {}", message),
        })?;

        Ok(())
    }

    async fn list_local_branches(&self, local_path: &Path) -> Result<Vec<String>> {
        let stdout = self
            .run(
                &["for-each-ref", "--format=%(refname:short)", "refs/heads/"],
                Some(local_path),
                None,
            )
            .await
            .map_err(|message| Self::remote_error(local_path, message))?;

        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn add_or_replace_remote(
        &self,
        local_path: &Path,
        remote_name: &str,
        remote_url: &str,
    ) -> Result<()> {
        let remotes = self
            .run(&["remote"], Some(local_path), None)
            .await
            .map_err(|message| Self::remote_error(local_path, message))?;

        if remotes.lines().any(|line| line.trim() == remote_name) {
            debug!("Replacing existing remote {} in {}", remote_name, local_path.display());
            self.run(&["remote", "remove", remote_name], Some(local_path), None)
                .await
                .map_err(|message| Self::remote_error(local_path, message))?;
        }

        self.run(
            &["remote", "add", "--", remote_name, remote_url],
            Some(local_path),
            None,
        )
        .await
        .map_err(|message| Self::remote_error(local_path, message))?;

        Ok(())
    }

    async fn push_branch(
        &self,
        local_path: &Path,
        remote_name: &str,
        branch: &str,
        credential: &Credential,
    ) -> Result<()> {
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");

        self.run(
            &["push", "--quiet", remote_name, &refspec],
            Some(local_path),
            Some(credential),
        )
        .await
        .map_err(|message| MirrorError::Push {
            repository: repository_label(local_path),
            branch: branch.to_string(),
            message: format!("Git push failed: {}", message),
        })?;

        Ok(())
    }
}
