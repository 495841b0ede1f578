//! Branch synchronizer - clone each source repository and push every branch
//!
//! Repositories are processed one at a time in source order. The first
//! failure aborts the whole pass; nothing already pushed is rolled back.

use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::directory::{Credential, RepositoryRecord};
use crate::error::{MirrorError, Result};
use crate::git::VcsClient;
use crate::inventory::DestinationInventory;
use crate::naming::dest_name;
use crate::report::{MirrorEvent, Reporter};
use crate::workspace::Workspace;

/// Name of the remote binding that points at the destination repository
pub const DEST_REMOTE: &str = "dest";

/// What happened to one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSync {
    pub source: String,
    pub target: String,
    pub path: PathBuf,
    pub branches: Vec<String>,
}

/// Results from a complete synchronization pass
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub total_repositories: usize,
    pub branches_pushed: usize,
    pub duration: Duration,
    pub results: Vec<RepoSync>,
}

/// Pushes every branch of every source repository to its destination
pub struct BranchSynchronizer<'a> {
    vcs: &'a dyn VcsClient,
    source_credential: &'a Credential,
    dest_credential: &'a Credential,
}

impl<'a> BranchSynchronizer<'a> {
    pub fn new(
        vcs: &'a dyn VcsClient,
        source_credential: &'a Credential,
        dest_credential: &'a Credential,
    ) -> Self {
        Self {
            vcs,
            source_credential,
            dest_credential,
        }
    }

    /// Dry-run: report the clone and push each repository would get
    ///
    /// A repository whose destination was only planned (not created) is
    /// reported against its future name instead of failing.
    pub fn plan(
        &self,
        source: &[RepositoryRecord],
        dest: &DestinationInventory,
        reporter: &mut dyn Reporter,
    ) -> SyncSummary {
        for record in source {
            let target = dest_name(&record.name);
            reporter.report(MirrorEvent::WouldSync {
                source: record.name.clone(),
                source_url: record.web_url.clone(),
                target_url: dest.get(&target).map(|r| r.web_url.clone()),
                target,
            });
        }

        SyncSummary {
            total_repositories: source.len(),
            ..Default::default()
        }
    }

    /// Clone every source repository into `workspace` and push all branches
    pub async fn sync_all(
        &self,
        source: &[RepositoryRecord],
        dest: &DestinationInventory,
        workspace: &Workspace,
        reporter: &mut dyn Reporter,
    ) -> Result<SyncSummary> {
        let start_time = Instant::now();
        let mut results = Vec::with_capacity(source.len());

        for record in source {
            let target_name = dest_name(&record.name);
            let target = dest
                .get(&target_name)
                .ok_or_else(|| MirrorError::InvariantViolation {
                    repository: record.name.clone(),
                    target: target_name.clone(),
                })?;

            let result = self
                .sync_repository(record, target, workspace, reporter)
                .await?;
            results.push(result);
        }

        let summary = SyncSummary {
            total_repositories: results.len(),
            branches_pushed: results.iter().map(|r| r.branches.len()).sum(),
            duration: start_time.elapsed(),
            results,
        };

        info!(
            "Synchronized {} repositories ({} branches) in {:.2}s",
            summary.total_repositories,
            summary.branches_pushed,
            summary.duration.as_secs_f64()
        );

        Ok(summary)
    }

    async fn sync_repository(
        &self,
        record: &RepositoryRecord,
        target: &RepositoryRecord,
        workspace: &Workspace,
        reporter: &mut dyn Reporter,
    ) -> Result<RepoSync> {
        let path = workspace.repository_dir(&record.name)?;

        reporter.report(MirrorEvent::Cloning {
            source: record.name.clone(),
        });
        self.vcs
            .clone_repository(&record.remote_url, &path, self.source_credential)
            .await?;

        self.vcs
            .add_or_replace_remote(&path, DEST_REMOTE, &target.remote_url)
            .await?;

        let branches = self.vcs.list_local_branches(&path).await?;
        debug!("{} has {} branches", record.name, branches.len());

        for branch in &branches {
            reporter.report(MirrorEvent::Pushing {
                source: record.name.clone(),
                branch: branch.clone(),
                target: target.name.clone(),
                target_url: target.web_url.clone(),
            });
            self.vcs
                .push_branch(&path, DEST_REMOTE, branch, self.dest_credential)
                .await
                .map_err(|err| push_error(&record.name, branch, err))?;
        }

        Ok(RepoSync {
            source: record.name.clone(),
            target: target.name.clone(),
            path,
            branches,
        })
    }
}

/// Name the source repository in a push failure
fn push_error(repository: &str, branch: &str, err: MirrorError) -> MirrorError {
    match err {
        MirrorError::Push { message, .. } => MirrorError::Push {
            repository: repository.to_string(),
            branch: branch.to_string(),
            message,
        },
        other => other,
    }
}
