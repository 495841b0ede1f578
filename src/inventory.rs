//! Repository inventories for both sides of a mirror run

use std::collections::HashMap;
use tracing::debug;

use crate::directory::{DirectoryService, RepositoryRecord};
use crate::error::Result;

/// Fetch the repository list of `project`
///
/// One round-trip to the directory service, no retries.
pub async fn fetch_inventory(
    service: &dyn DirectoryService,
    project: &str,
) -> Result<Vec<RepositoryRecord>> {
    debug!(
        "Fetching inventory of {} from {}",
        project,
        service.endpoint_url()
    );
    service.list_repositories(project).await
}

/// Destination repositories keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationInventory {
    records: HashMap<String, RepositoryRecord>,
}

impl DestinationInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&RepositoryRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return the inventory extended with `record`, keyed by its name
    pub fn with_record(mut self, record: RepositoryRecord) -> Self {
        self.records.insert(record.name.clone(), record);
        self
    }
}

impl FromIterator<RepositoryRecord> for DestinationInventory {
    fn from_iter<I: IntoIterator<Item = RepositoryRecord>>(iter: I) -> Self {
        Self {
            records: iter
                .into_iter()
                .map(|record| (record.name.clone(), record))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MockDirectoryService;

    fn record(name: &str) -> RepositoryRecord {
        RepositoryRecord::new(
            name,
            format!("https://host/{}.git", name),
            format!("https://host/{}", name),
        )
    }

    #[tokio::test]
    async fn test_fetch_inventory_calls_service_once() {
        let mut service = MockDirectoryService::new();
        service
            .expect_endpoint_url()
            .return_const("https://dev.azure.com/contoso".to_string());
        service
            .expect_list_repositories()
            .withf(|project| project == "Alpha")
            .times(1)
            .returning(|_| Ok(vec![record("b"), record("a")]));

        let records = fetch_inventory(&service, "Alpha").await.unwrap();
        assert_eq!(records, vec![record("b"), record("a")]);
    }

    #[test]
    fn test_destination_inventory_is_keyed_by_name() {
        let inventory: DestinationInventory = vec![record("export_a"), record("export_b")]
            .into_iter()
            .collect();

        assert_eq!(inventory.len(), 2);
        assert!(inventory.contains("export_a"));
        assert!(!inventory.contains("a"));
        assert_eq!(inventory.get("export_b"), Some(&record("export_b")));
    }

    #[test]
    fn test_with_record_returns_extended_inventory() {
        let before = DestinationInventory::new();
        let after = before.clone().with_record(record("export_a"));

        assert!(before.is_empty());
        assert!(after.contains("export_a"));
    }
}
