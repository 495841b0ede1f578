//! Run controller - one complete mirror run
//!
//! resolve destination project -> fetch both inventories -> create missing
//! repositories -> push every branch. The dry-run flag is read once and
//! threaded through; the first error ends the run.

use std::path::PathBuf;
use tracing::info;

use crate::directory::{Credential, DirectoryService};
use crate::error::Result;
use crate::git::VcsClient;
use crate::inventory::{fetch_inventory, DestinationInventory};
use crate::reconcile::reconcile;
use crate::report::{MirrorEvent, Reporter};
use crate::sync::{BranchSynchronizer, SyncSummary};
use crate::workspace::{RunIdSource, Workspace};

/// Everything a run needs to know up front
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub source_project: String,
    pub destination_project: String,
    pub source_credential: Credential,
    pub destination_credential: Credential,
    /// Parent directory of the run workspace
    pub workspace_root: PathBuf,
    /// Remove the run workspace after a successful run
    pub cleanup: bool,
    pub dry_run: bool,
}

/// The external services a run talks to
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub source: &'a dyn DirectoryService,
    pub destination: &'a dyn DirectoryService,
    pub vcs: &'a dyn VcsClient,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub dry_run: bool,
    /// Destination names that were missing when the run started
    pub missing: Vec<String>,
    /// Destination names created by this run
    pub created: Vec<String>,
    pub sync: SyncSummary,
    /// Run workspace, unless dry-run or cleaned up
    pub workspace: Option<PathBuf>,
}

/// Mirror every source repository into the destination project
pub async fn run_mirror(
    settings: &RunSettings,
    services: Collaborators<'_>,
    ids: &mut dyn RunIdSource,
    reporter: &mut dyn Reporter,
) -> Result<RunSummary> {
    info!(
        "Mirroring {} @ {} into {} @ {}{}",
        settings.source_project,
        services.source.endpoint_url(),
        settings.destination_project,
        services.destination.endpoint_url(),
        if settings.dry_run { " (dry run)" } else { "" }
    );

    let project = services
        .destination
        .resolve_project(&settings.destination_project)
        .await?;

    let source = fetch_inventory(services.source, &settings.source_project).await?;
    let destination: DestinationInventory =
        fetch_inventory(services.destination, &settings.destination_project)
            .await?
            .into_iter()
            .collect();

    // Staged before any mutation so a bad workspace root fails early
    let workspace = if settings.dry_run {
        None
    } else {
        let workspace = Workspace::create(&settings.workspace_root, ids)?;
        reporter.report(MirrorEvent::UsingWorkspace {
            path: workspace.path().to_path_buf(),
        });
        Some(workspace)
    };

    let reconciliation = reconcile(
        services.destination,
        &source,
        destination,
        &project,
        settings.dry_run,
        reporter,
    )
    .await?;

    let synchronizer = BranchSynchronizer::new(
        services.vcs,
        &settings.source_credential,
        &settings.destination_credential,
    );

    let (sync, workspace_path) = match workspace {
        None => (
            synchronizer.plan(&source, &reconciliation.inventory, reporter),
            None,
        ),
        Some(workspace) => {
            let summary = synchronizer
                .sync_all(&source, &reconciliation.inventory, &workspace, reporter)
                .await?;

            if settings.cleanup {
                workspace.remove()?;
                (summary, None)
            } else {
                (summary, Some(workspace.path().to_path_buf()))
            }
        }
    };

    Ok(RunSummary {
        dry_run: settings.dry_run,
        missing: reconciliation.missing,
        created: reconciliation.created,
        sync,
        workspace: workspace_path,
    })
}
