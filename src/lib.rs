//! repomirror - Mirror a project's repositories into another project
//!
//! Each run discovers the repositories of a source project and a destination
//! project, creates every repository missing at the destination (named
//! `export_<source name>`), then re-clones each source repository and pushes
//! every branch to its destination counterpart.
//!
//! ## Modules
//!
//! - [`config`]: Configuration file, environment overrides and validation
//! - [`directory`]: Provider-agnostic project directory interface
//! - [`azure`] / [`github`]: Directory implementations
//! - [`git`]: Clone, remote and push operations via the `git` binary
//! - [`inventory`], [`reconcile`], [`sync`]: The mirror pipeline
//! - [`run`]: Sequencing of one complete run

pub mod azure;
pub mod config;
pub mod directory;
pub mod error;
pub mod git;
pub mod github;
pub mod health;
pub mod inventory;
pub mod naming;
pub mod reconcile;
pub mod report;
pub mod run;
pub mod sync;
pub mod workspace;

pub use config::Config;
pub use directory::{Credential, DirectoryService, Endpoint, ProjectRef, RepositoryRecord};
pub use error::MirrorError;
pub use git::{GitCli, VcsClient};
pub use health::HealthCheck;
pub use run::{run_mirror, Collaborators, RunSettings, RunSummary};
pub use sync::{SyncSummary, DEST_REMOTE};
