//! Operator-facing progress lines
//!
//! Everything a run wants the operator to see goes through a [`Reporter`].
//! In dry-run mode these lines are the only effect of a run.

use std::fmt;
use std::path::PathBuf;

/// One progress or report line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    /// The run staged its clones under this directory
    UsingWorkspace { path: PathBuf },
    /// Dry-run: the destination repository would be created
    WouldCreate {
        source: String,
        target: String,
        endpoint: String,
    },
    /// The destination repository was created
    Created { source: String, target: String },
    /// Dry-run: the repository would be cloned and pushed
    WouldSync {
        source: String,
        source_url: String,
        target: String,
        /// `None` when the destination repository does not exist yet
        target_url: Option<String>,
    },
    /// Cloning has started
    Cloning { source: String },
    /// One branch is being pushed
    Pushing {
        source: String,
        branch: String,
        target: String,
        target_url: String,
    },
}

impl fmt::Display for MirrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorEvent::UsingWorkspace { path } => write!(f, "Using path {}", path.display()),
            MirrorEvent::WouldCreate {
                source,
                target,
                endpoint,
            } => write!(f, "Would create repo {} as {} in {}", source, target, endpoint),
            MirrorEvent::Created { source, target } => {
                write!(f, "Created repo {} for {}", target, source)
            }
            MirrorEvent::WouldSync {
                source,
                source_url,
                target,
                target_url,
            } => match target_url {
                Some(url) => write!(
                    f,
                    "Would clone {} @ {} and sync to {} @ {}",
                    source, source_url, target, url
                ),
                None => write!(
                    f,
                    "Would clone {} @ {} and sync to {} (not created yet)",
                    source, source_url, target
                ),
            },
            MirrorEvent::Cloning { source } => write!(f, "Cloning source {}", source),
            MirrorEvent::Pushing {
                source,
                branch,
                target,
                target_url,
            } => write!(
                f,
                "Pushing source {}:{} to {}:{} @ {}",
                source, branch, target, branch, target_url
            ),
        }
    }
}

/// Sink for progress lines
pub trait Reporter {
    fn report(&mut self, event: MirrorEvent);
}

/// Prints every event as one line on stdout
#[derive(Debug, Default)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn report(&mut self, event: MirrorEvent) {
        println!("{}", event);
    }
}

/// Collects events, used to inspect what a run reported
impl Reporter for Vec<MirrorEvent> {
    fn report(&mut self, event: MirrorEvent) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_lines() {
        let create = MirrorEvent::WouldCreate {
            source: "beta".to_string(),
            target: "export_beta".to_string(),
            endpoint: "https://dev.azure.com/fabrikam".to_string(),
        };
        assert_eq!(
            create.to_string(),
            "Would create repo beta as export_beta in https://dev.azure.com/fabrikam"
        );

        let sync = MirrorEvent::WouldSync {
            source: "beta".to_string(),
            source_url: "https://src/beta".to_string(),
            target: "export_beta".to_string(),
            target_url: None,
        };
        assert_eq!(
            sync.to_string(),
            "Would clone beta @ https://src/beta and sync to export_beta (not created yet)"
        );
    }

    #[test]
    fn test_push_line_names_branch_on_both_sides() {
        let event = MirrorEvent::Pushing {
            source: "alpha".to_string(),
            branch: "dev".to_string(),
            target: "export_alpha".to_string(),
            target_url: "https://dst/export_alpha".to_string(),
        };
        assert_eq!(
            event.to_string(),
            "Pushing source alpha:dev to export_alpha:dev @ https://dst/export_alpha"
        );
    }

    #[test]
    fn test_vec_reporter_collects_in_order() {
        let mut events: Vec<MirrorEvent> = Vec::new();
        events.report(MirrorEvent::Cloning {
            source: "a".to_string(),
        });
        events.report(MirrorEvent::Cloning {
            source: "b".to_string(),
        });
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].to_string(), "Cloning source b");
    }
}
