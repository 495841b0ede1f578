use anyhow::{anyhow, Context};
use async_trait::async_trait;
use octocrab::models::Repository;
use octocrab::Octocrab;
use std::process::Command;
use tracing::{debug, info};

use crate::directory::{DirectoryService, Endpoint, ProjectRef, RepositoryRecord};
use crate::error::{MirrorError, Result};

/// Default GitHub API endpoint
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub client wrapper
///
/// On GitHub the "project" is the organization that owns the repositories.
pub struct GitHubClient {
    client: Octocrab,
    base_url: String,
}

impl GitHubClient {
    /// Create a new GitHub client for `endpoint`
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(endpoint: &Endpoint) -> Result<Self> {
        let base_url = endpoint.base_url.trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .base_uri(base_url.as_str())
            .map_err(|e| MirrorError::transport(&base_url, e))?
            .personal_token(endpoint.credential.token().to_string())
            .build()
            .map_err(|e| MirrorError::transport(&base_url, e))?;

        Ok(Self { client, base_url })
    }

    fn map_error(&self, err: octocrab::Error, org: &str) -> MirrorError {
        match &err {
            octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404 => {
                MirrorError::ProjectNotFound {
                    endpoint: self.base_url.clone(),
                    project: org.to_string(),
                }
            }
            _ => MirrorError::transport(&self.base_url, err),
        }
    }
}

/// Convert an octocrab repository into a record, filling URLs GitHub omitted
fn to_record(repo: &Repository, org: &str) -> RepositoryRecord {
    let remote_url = repo
        .clone_url
        .as_ref()
        .map(|u| u.to_string())
        .unwrap_or_else(|| format!("https://github.com/{}/{}.git", org, repo.name));
    let web_url = repo
        .html_url
        .as_ref()
        .map(|u| u.to_string())
        .unwrap_or_else(|| format!("https://github.com/{}/{}", org, repo.name));

    RepositoryRecord::new(repo.name.clone(), remote_url, web_url)
}

#[async_trait]
impl DirectoryService for GitHubClient {
    fn endpoint_url(&self) -> String {
        self.base_url.clone()
    }

    async fn resolve_project(&self, org: &str) -> Result<ProjectRef> {
        let organization = self
            .client
            .orgs(org)
            .get()
            .await
            .map_err(|e| self.map_error(e, org))?;

        Ok(ProjectRef {
            id: organization.id.to_string(),
            name: organization.login,
        })
    }

    async fn list_repositories(&self, org: &str) -> Result<Vec<RepositoryRecord>> {
        debug!("Fetching repositories for organization: {}", org);

        let first_page = self
            .client
            .orgs(org)
            .list_repos()
            .per_page(100)
            .send()
            .await
            .map_err(|e| self.map_error(e, org))?;

        // Follows the `Link: rel="next"` chain until GitHub stops sending one
        let repositories: Vec<RepositoryRecord> = self
            .client
            .all_pages(first_page)
            .await
            .map_err(|e| self.map_error(e, org))?
            .iter()
            .map(|repo| to_record(repo, org))
            .collect();

        info!(
            "Found {} repositories for organization: {}",
            repositories.len(),
            org
        );
        Ok(repositories)
    }

    async fn create_repository(
        &self,
        project: &ProjectRef,
        name: &str,
    ) -> Result<RepositoryRecord> {
        let route = format!("/orgs/{}/repos", project.name);
        let body = serde_json::json!({ "name": name, "private": true });

        let repo: Repository = self
            .client
            .post(route, Some(&body))
            .await
            .map_err(|e| MirrorError::RepositoryCreate {
                repository: name.to_string(),
                target: name.to_string(),
                message: e.to_string(),
            })?;

        info!("Created repository {}/{}", project.name, repo.name);
        Ok(to_record(&repo, &project.name))
    }
}

/// Try to get a token from the GitHub CLI
///
/// Used when a GitHub endpoint is configured without an explicit token.
pub fn token_from_gh_cli() -> anyhow::Result<String> {
    debug!("Attempting GitHub CLI authentication");

    if !is_command_available("gh") {
        return Err(anyhow!("GitHub CLI (gh) is not installed"));
    }

    let token_output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .context("Failed to get GitHub CLI token")?;

    if !token_output.status.success() {
        return Err(anyhow!(
            "Failed to retrieve token from GitHub CLI: {}",
            String::from_utf8_lossy(&token_output.stderr)
        ));
    }

    let token = String::from_utf8(token_output.stdout)
        .context("GitHub CLI token is not valid UTF-8")?
        .trim()
        .to_string();

    if token.is_empty() {
        return Err(anyhow!("GitHub CLI returned empty token"));
    }

    debug!("Successfully obtained token from GitHub CLI");
    Ok(token)
}

/// Check if a command is available in PATH
pub(crate) fn is_command_available(command: &str) -> bool {
    Command::new("which")
        .arg(command)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
