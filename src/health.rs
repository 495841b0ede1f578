//! System health checks for repomirror
//!
//! This module provides preflight checks to verify the system is properly
//! configured before running a mirror.

use crate::config::{Config, EndpointConfig};
use crate::directory::connect;

/// Result of system health checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Git installation status
    pub git: CheckResult,
    /// Source endpoint configuration and reachability
    pub source: CheckResult,
    /// Destination endpoint configuration and reachability
    pub destination: CheckResult,
    /// Workspace root status
    pub workspace: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

impl CheckResult {
    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all health checks
    pub async fn run(config: &Config) -> Self {
        Self {
            git: Self::check_git(),
            source: Self::check_endpoint("source", &config.source).await,
            destination: Self::check_endpoint("destination", &config.destination).await,
            workspace: Self::check_workspace(config),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.all_checks().iter().all(|(_, result)| result.passed)
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, result)| result)
            .filter(|r| r.is_warning)
            .collect()
    }

    /// Check git installation
    fn check_git() -> CheckResult {
        match std::process::Command::new("git").arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                CheckResult::ok_with_details("Git installed", version.trim().to_string())
            }
            Ok(_) => CheckResult::error_with_details("Git command failed", "Run: git --version"),
            Err(_) => CheckResult::error_with_details(
                "Git not found in PATH",
                "Install git: https://git-scm.com/downloads",
            ),
        }
    }

    /// Check one side: configuration first, then the project lookup
    async fn check_endpoint(label: &str, endpoint: &EndpointConfig) -> CheckResult {
        let side = match endpoint.resolve(label) {
            Ok(side) => side,
            Err(e) => {
                return CheckResult::error_with_details(
                    format!("Incomplete {} configuration", label),
                    format!("{:#}", e),
                )
            }
        };

        let service = match connect(&side.endpoint) {
            Ok(service) => service,
            Err(e) => {
                return CheckResult::error_with_details(
                    format!("Cannot connect to {}", side.endpoint.base_url),
                    e.to_string(),
                )
            }
        };

        match service.resolve_project(&side.project).await {
            Ok(project) => CheckResult::ok_with_details(
                format!("{} project reachable", capitalize(label)),
                format!("{} @ {} ({})", project.name, side.endpoint.base_url, project.id),
            ),
            Err(e) => CheckResult::error_with_details(
                format!("{} project not reachable", capitalize(label)),
                e.to_string(),
            ),
        }
    }

    /// Check the workspace root can host run directories
    fn check_workspace(config: &Config) -> CheckResult {
        let root = config.workspace_root();
        let shown = root.display().to_string();

        if root.is_dir() {
            CheckResult::ok_with_details("Workspace root exists", shown)
        } else if root.exists() {
            CheckResult::error_with_details("Workspace root is not a directory", shown)
        } else {
            CheckResult::warning_with_details(
                "Workspace root does not exist yet",
                format!("{} will be created on the first run", shown),
            )
        }
    }

    /// Get all checks for iteration
    pub fn all_checks(&self) -> [(&'static str, &CheckResult); 4] {
        [
            ("Git Installation", &self.git),
            ("Source Project", &self.source),
            ("Destination Project", &self.destination),
            ("Workspace", &self.workspace),
        ]
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
