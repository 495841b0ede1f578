//! Project directory abstraction layer
//!
//! This module provides a provider-agnostic interface to the code-hosting
//! service that owns a project's repositories (Azure DevOps, GitHub, ...).
//! The mirror core only ever talks to a [`DirectoryService`].

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use std::fmt;

use crate::azure::AzureDevOpsClient;
use crate::config::Provider;
use crate::error::Result;
use crate::github::GitHubClient;

/// Access token for one side of the mirror
///
/// The token never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for an HTTP `Authorization` header understood by git hosts
    ///
    /// The token is used as both user and password, which Azure DevOps and
    /// GitHub both accept for personal access tokens.
    pub fn basic_auth_header(&self) -> String {
        let pair = format!("{}:{}", self.token, self.token);
        format!("Basic {}", STANDARD.encode(pair))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A code-hosting endpoint plus the credential used against it
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub provider: Provider,
    pub base_url: String,
    pub credential: Credential,
}

/// Resolved reference to a project, required to create repositories in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

/// One repository of a project
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryRecord {
    /// Repository name, unique within its project
    pub name: String,
    /// URL used to clone from and push to
    #[serde(rename = "remoteUrl")]
    pub remote_url: String,
    /// URL shown to humans
    #[serde(rename = "webUrl")]
    pub web_url: String,
}

impl RepositoryRecord {
    pub fn new(
        name: impl Into<String>,
        remote_url: impl Into<String>,
        web_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            remote_url: remote_url.into(),
            web_url: web_url.into(),
        }
    }
}

/// Trait for the project directory of a code-hosting provider
///
/// Implement this trait to mirror from or to another provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Base URL of the endpoint, for reporting
    fn endpoint_url(&self) -> String;

    /// Resolve a project name into the reference needed for creation
    async fn resolve_project(&self, project: &str) -> Result<ProjectRef>;

    /// List every repository of a project
    async fn list_repositories(&self, project: &str) -> Result<Vec<RepositoryRecord>>;

    /// Create a repository named `name` inside `project`
    async fn create_repository(&self, project: &ProjectRef, name: &str)
        -> Result<RepositoryRecord>;
}

/// Build the directory client matching the endpoint's provider
pub fn connect(endpoint: &Endpoint) -> Result<Box<dyn DirectoryService>> {
    match endpoint.provider {
        Provider::AzureDevOps => Ok(Box::new(AzureDevOpsClient::new(endpoint)?)),
        Provider::GitHub => Ok(Box::new(GitHubClient::new(endpoint)?)),
    }
}
