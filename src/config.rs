use anyhow::{anyhow, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::directory::{Credential, Endpoint};
use crate::github::{token_from_gh_cli, GITHUB_API_URL};
use crate::workspace;

/// Main configuration structure for repomirror
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Project the repositories are copied from
    #[serde(default)]
    pub source: EndpointConfig,

    /// Project the repositories are copied into
    #[serde(default)]
    pub destination: EndpointConfig,

    /// Clone staging settings
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Report intended actions without changing anything
    #[serde(default)]
    pub dry_run: bool,
}

/// Code-hosting provider of one side
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    #[serde(rename = "azure-devops")]
    AzureDevOps,
    #[serde(rename = "github")]
    GitHub,
}

/// One side of the mirror
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct EndpointConfig {
    #[serde(default)]
    pub provider: Provider,

    /// Azure DevOps organization (`https://dev.azure.com/<organization>`)
    pub organization: Option<String>,

    /// Explicit base URL, overrides the one derived from the provider
    pub url: Option<String>,

    /// Project name (the owning organization on GitHub)
    pub project: Option<String>,

    /// Personal access token
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

/// Clone staging configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WorkspaceConfig {
    /// Parent directory of run workspaces (defaults to `$TMPDIR/repocloner`)
    pub root: Option<String>,

    /// Remove the run workspace after a successful run
    #[serde(default)]
    pub cleanup: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A fully resolved side: where to connect and which project to mirror
#[derive(Debug, Clone)]
pub struct Side {
    pub endpoint: Endpoint,
    pub project: String,
}

/// Environment variable names for one side
struct EnvKeys {
    organization: &'static str,
    project: &'static str,
    token: &'static str,
}

const SOURCE_ENV: EnvKeys = EnvKeys {
    organization: "ORG1",
    project: "PROJ1",
    token: "PAT1",
};

const DESTINATION_ENV: EnvKeys = EnvKeys {
    organization: "ORG2",
    project: "PROJ2",
    token: "PAT2",
};

/// Set when the run should only report
pub const DRY_RUN_ENV: &str = "DRYRUN";

impl EndpointConfig {
    fn apply_env(&mut self, keys: &EnvKeys, lookup: &dyn Fn(&str) -> Option<String>) {
        if let Some(organization) = lookup(keys.organization) {
            self.organization = Some(organization);
        }
        if let Some(project) = lookup(keys.project) {
            self.project = Some(project);
        }
        if let Some(token) = lookup(keys.token) {
            self.token = Some(token);
        }
    }

    /// Base URL of the provider API for this side
    pub fn base_url(&self) -> Result<String> {
        if let Some(url) = non_empty(&self.url) {
            return Ok(url.trim_end_matches('/').to_string());
        }

        match self.provider {
            Provider::AzureDevOps => {
                let organization = non_empty(&self.organization)
                    .ok_or_else(|| anyhow!("organization is not set"))?;
                Ok(format!("https://dev.azure.com/{}", organization))
            }
            Provider::GitHub => Ok(GITHUB_API_URL.to_string()),
        }
    }

    /// Validate this side and turn it into an [`Endpoint`] plus project name
    ///
    /// A GitHub side without a token falls back to the GitHub CLI.
    pub fn resolve(&self, label: &str) -> Result<Side> {
        let base_url = self
            .base_url()
            .with_context(|| format!("Invalid {} endpoint", label))?;

        let project = non_empty(&self.project)
            .ok_or_else(|| anyhow!("{} project is not set", label))?
            .to_string();

        let token = match (non_empty(&self.token), self.provider) {
            (Some(token), _) => token.to_string(),
            (None, Provider::GitHub) => token_from_gh_cli()
                .with_context(|| format!("No {} token configured", label))?,
            (None, Provider::AzureDevOps) => {
                return Err(anyhow!("{} access token is not set", label));
            }
        };

        Ok(Side {
            endpoint: Endpoint {
                provider: self.provider,
                base_url,
                credential: Credential::new(token),
            },
            project,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from the default location, or defaults if absent
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repomirror").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        if let Some(root) = &self.workspace.root {
            let expanded = shellexpand::full(root)
                .context("Failed to expand workspace.root path")?
                .into_owned();
            self.workspace.root = Some(expanded);
        }

        Ok(())
    }

    /// Overlay `ORG1`/`PROJ1`/`PAT1`, `ORG2`/`PROJ2`/`PAT2` and `DRYRUN`
    ///
    /// `DRYRUN` switches dry-run on when set to any non-empty value.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.source.apply_env(&SOURCE_ENV, &lookup);
        self.destination.apply_env(&DESTINATION_ENV, &lookup);

        if lookup(DRY_RUN_ENV).is_some_and(|value| !value.is_empty()) {
            self.dry_run = true;
        }
    }

    /// Overlay the process environment
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Parent directory for run workspaces
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace
            .root
            .as_deref()
            .filter(|root| !root.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(workspace::default_root)
    }
}
