//! Error types for a mirror run
//!
//! Every variant carries enough context (endpoint, repository, branch) for an
//! operator to diagnose the failure and re-run. All of them are fatal: the run
//! stops at the first one.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while mirroring repositories between two projects
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The endpoint could not be reached or rejected the credential
    #[error("transport error talking to {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The project name did not resolve at the endpoint
    #[error("project '{project}' not found at {endpoint}")]
    ProjectNotFound { endpoint: String, project: String },

    /// The destination refused to create a repository
    #[error("failed to create '{target}' for source repository '{repository}': {message}")]
    RepositoryCreate {
        repository: String,
        target: String,
        message: String,
    },

    /// Cloning a source repository failed
    #[error("failed to clone '{repository}' from {url}: {message}")]
    Clone {
        repository: String,
        url: String,
        message: String,
    },

    /// Pushing one branch to the destination failed
    #[error("failed to push branch '{branch}' of '{repository}': {message}")]
    Push {
        repository: String,
        branch: String,
        message: String,
    },

    /// Configuring the destination remote or reading branches of a clone failed
    #[error("git remote operation failed in {path}: {message}")]
    Remote { path: PathBuf, message: String },

    /// Staging directory could not be prepared
    #[error("workspace error at {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A destination record was missing after reconciliation
    #[error("invariant violated: no destination repository '{target}' for source '{repository}'")]
    InvariantViolation { repository: String, target: String },
}

impl MirrorError {
    pub(crate) fn transport(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn workspace(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Workspace {
            path: path.into(),
            source,
        }
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, MirrorError>;
