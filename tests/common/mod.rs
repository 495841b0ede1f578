//! Common test utilities and helpers for repomirror tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use repomirror::directory::{Credential, DirectoryService, ProjectRef, RepositoryRecord};
use repomirror::error::Result;
use repomirror::MirrorError;

pub fn record(host: &str, name: &str) -> RepositoryRecord {
    RepositoryRecord::new(
        name,
        format!("https://{}/_git/{}", host, name),
        format!("https://{}/{}", host, name),
    )
}

/// Calls seen by a [`FakeDirectory`], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    Resolve(String),
    List(String),
    Create(String),
}

/// In-memory project directory holding a single project
pub struct FakeDirectory {
    host: String,
    project: String,
    repositories: Mutex<Vec<RepositoryRecord>>,
    calls: Mutex<Vec<DirectoryCall>>,
    reject_create: Option<String>,
}

impl FakeDirectory {
    pub fn new(host: &str, project: &str, names: &[&str]) -> Self {
        Self {
            host: host.to_string(),
            project: project.to_string(),
            repositories: Mutex::new(names.iter().map(|n| record(host, n)).collect()),
            calls: Mutex::new(Vec::new()),
            reject_create: None,
        }
    }

    /// Refuse to create the repository named `name`
    pub fn rejecting_create(mut self, name: &str) -> Self {
        self.reject_create = Some(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DirectoryCall::Create(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.repositories
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    fn check_project(&self, project: &str) -> Result<()> {
        if project == self.project {
            Ok(())
        } else {
            Err(MirrorError::ProjectNotFound {
                endpoint: self.endpoint_url(),
                project: project.to_string(),
            })
        }
    }
}

#[async_trait]
impl DirectoryService for FakeDirectory {
    fn endpoint_url(&self) -> String {
        format!("https://{}", self.host)
    }

    async fn resolve_project(&self, project: &str) -> Result<ProjectRef> {
        self.calls
            .lock()
            .unwrap()
            .push(DirectoryCall::Resolve(project.to_string()));
        self.check_project(project)?;
        Ok(ProjectRef {
            id: format!("{}-id", project),
            name: project.to_string(),
        })
    }

    async fn list_repositories(&self, project: &str) -> Result<Vec<RepositoryRecord>> {
        self.calls
            .lock()
            .unwrap()
            .push(DirectoryCall::List(project.to_string()));
        self.check_project(project)?;
        Ok(self.repositories.lock().unwrap().clone())
    }

    async fn create_repository(
        &self,
        project: &ProjectRef,
        name: &str,
    ) -> Result<RepositoryRecord> {
        self.calls
            .lock()
            .unwrap()
            .push(DirectoryCall::Create(name.to_string()));
        if self.reject_create.as_deref() == Some(name) {
            return Err(MirrorError::RepositoryCreate {
                repository: name.to_string(),
                target: name.to_string(),
                message: "HTTP 409: already exists".to_string(),
            });
        }
        self.check_project(&project.name)?;

        let created = record(&self.host, name);
        self.repositories.lock().unwrap().push(created.clone());
        Ok(created)
    }
}

/// Calls seen by a [`FakeVcs`], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Clone {
        url: String,
        path: PathBuf,
        token: String,
    },
    ListBranches {
        path: PathBuf,
    },
    AddRemote {
        path: PathBuf,
        name: String,
        url: String,
    },
    Push {
        path: PathBuf,
        remote: String,
        branch: String,
        token: String,
    },
}

/// Version control that records calls instead of running git
pub struct FakeVcs {
    branches: HashMap<String, Vec<String>>,
    failing_clone: Option<String>,
    cloned: Mutex<HashMap<PathBuf, String>>,
    calls: Mutex<Vec<VcsCall>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self {
            branches: HashMap::new(),
            failing_clone: None,
            cloned: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Branches a clone of `url` will contain (default: `main` only)
    pub fn with_branches(mut self, url: &str, branches: &[&str]) -> Self {
        self.branches.insert(
            url.to_string(),
            branches.iter().map(|b| b.to_string()).collect(),
        );
        self
    }

    /// Make cloning `url` fail
    pub fn failing_clone(mut self, url: &str) -> Self {
        self.failing_clone = Some(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn cloned_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                VcsCall::Clone { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn pushes(&self) -> Vec<VcsCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, VcsCall::Push { .. }))
            .collect()
    }
}

#[async_trait]
impl repomirror::VcsClient for FakeVcs {
    async fn clone_repository(
        &self,
        remote_url: &str,
        local_path: &Path,
        credential: &Credential,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(VcsCall::Clone {
            url: remote_url.to_string(),
            path: local_path.to_path_buf(),
            token: credential.token().to_string(),
        });
        if self.failing_clone.as_deref() == Some(remote_url) {
            return Err(MirrorError::Clone {
                repository: local_path.display().to_string(),
                url: remote_url.to_string(),
                message: "repository not found".to_string(),
            });
        }
        self.cloned
            .lock()
            .unwrap()
            .insert(local_path.to_path_buf(), remote_url.to_string());
        Ok(())
    }

    async fn list_local_branches(&self, local_path: &Path) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(VcsCall::ListBranches {
            path: local_path.to_path_buf(),
        });
        let url = self.cloned.lock().unwrap().get(local_path).cloned();
        Ok(url
            .and_then(|url| self.branches.get(&url).cloned())
            .unwrap_or_else(|| vec!["main".to_string()]))
    }

    async fn add_or_replace_remote(
        &self,
        local_path: &Path,
        remote_name: &str,
        remote_url: &str,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(VcsCall::AddRemote {
            path: local_path.to_path_buf(),
            name: remote_name.to_string(),
            url: remote_url.to_string(),
        });
        Ok(())
    }

    async fn push_branch(
        &self,
        local_path: &Path,
        remote_name: &str,
        branch: &str,
        credential: &Credential,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(VcsCall::Push {
            path: local_path.to_path_buf(),
            remote: remote_name.to_string(),
            branch: branch.to_string(),
            token: credential.token().to_string(),
        });
        Ok(())
    }
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
