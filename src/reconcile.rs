//! Reconciliation - create the repositories missing at the destination
//!
//! The missing-set is computed once from the fetched snapshot. Creations do
//! not feed back into it; they only extend the inventory handed on to the
//! branch synchronizer.

use tracing::{debug, info};

use crate::directory::{DirectoryService, ProjectRef, RepositoryRecord};
use crate::error::{MirrorError, Result};
use crate::inventory::DestinationInventory;
use crate::naming::dest_name;
use crate::report::{MirrorEvent, Reporter};

/// Outcome of the creation phase
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Destination inventory including every repository created by this run
    pub inventory: DestinationInventory,
    /// Destination names of the repositories that were missing
    pub missing: Vec<String>,
    /// Destination names actually created (empty in dry-run)
    pub created: Vec<String>,
}

/// Source repositories whose destination name is absent from `dest`
///
/// Source order is preserved.
pub fn missing_set<'a>(
    source: &'a [RepositoryRecord],
    dest: &DestinationInventory,
) -> Vec<&'a RepositoryRecord> {
    source
        .iter()
        .filter(|record| !dest.contains(&dest_name(&record.name)))
        .collect()
}

/// Create every missing repository at the destination
///
/// In dry-run mode each missing repository is reported and `dest` is
/// returned untouched. Stops at the first failed creation.
pub async fn reconcile(
    service: &dyn DirectoryService,
    source: &[RepositoryRecord],
    dest: DestinationInventory,
    project: &ProjectRef,
    dry_run: bool,
    reporter: &mut dyn Reporter,
) -> Result<Reconciliation> {
    let missing = missing_set(source, &dest);
    let missing_names: Vec<String> = missing.iter().map(|r| dest_name(&r.name)).collect();

    info!(
        "{} of {} source repositories missing at {}",
        missing.len(),
        source.len(),
        service.endpoint_url()
    );

    let mut inventory = dest;
    let mut created = Vec::new();

    for record in missing {
        let target = dest_name(&record.name);

        if dry_run {
            reporter.report(MirrorEvent::WouldCreate {
                source: record.name.clone(),
                target,
                endpoint: service.endpoint_url(),
            });
            continue;
        }

        debug!("Creating {} in project {}", target, project.name);
        let new_record = service
            .create_repository(project, &target)
            .await
            .map_err(|err| create_error(&record.name, &target, err))?;

        reporter.report(MirrorEvent::Created {
            source: record.name.clone(),
            target: new_record.name.clone(),
        });
        created.push(new_record.name.clone());
        inventory = inventory.with_record(new_record);
    }

    Ok(Reconciliation {
        inventory,
        missing: missing_names,
        created,
    })
}

/// Re-attribute a creation failure to the source repository
fn create_error(source: &str, target: &str, err: MirrorError) -> MirrorError {
    let message = match err {
        MirrorError::RepositoryCreate { message, .. } => message,
        other => other.to_string(),
    };
    MirrorError::RepositoryCreate {
        repository: source.to_string(),
        target: target.to_string(),
        message,
    }
}
