//! Temporary staging area for clones
//!
//! Each run gets `<root>/<run id>`, and each source repository one fresh
//! subdirectory inside it. Directories are never reused within a run.

use rand::Rng;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{MirrorError, Result};

const RUN_ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const RUN_ID_LENGTH: usize = 5;
const MAX_ID_ATTEMPTS: usize = 16;

/// Source of unique run directory names
pub trait RunIdSource {
    fn next_id(&mut self) -> String;
}

/// Short random lowercase alphanumeric identifiers
#[derive(Debug, Clone)]
pub struct RandomRunId {
    length: usize,
}

impl RandomRunId {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomRunId {
    fn default() -> Self {
        Self::new(RUN_ID_LENGTH)
    }
}

impl RunIdSource for RandomRunId {
    fn next_id(&mut self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| RUN_ID_CHARS[rng.gen_range(0..RUN_ID_CHARS.len())] as char)
            .collect()
    }
}

/// Deterministic identifiers: `run-1`, `run-2`, ...
#[derive(Debug, Clone, Default)]
pub struct SequentialRunId {
    counter: u64,
}

impl RunIdSource for SequentialRunId {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("run-{}", self.counter)
    }
}

/// Default parent directory for run workspaces
pub fn default_root() -> PathBuf {
    std::env::temp_dir().join("repocloner")
}

/// The staging directory of one run
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh run directory under `root`
    ///
    /// An identifier that is already taken is skipped in favour of the next one.
    pub fn create(root: &Path, ids: &mut dyn RunIdSource) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|e| MirrorError::workspace(root, e))?;

        let mut last_error = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            let path = root.join(ids.next_id());
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    info!("Using workspace {}", path.display());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Workspace {} already exists, trying another id", path.display());
                    last_error = Some(e);
                }
                Err(e) => return Err(MirrorError::workspace(path, e)),
            }
        }

        Err(MirrorError::workspace(
            root,
            last_error.unwrap_or_else(|| ErrorKind::AlreadyExists.into()),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Allocate the clone directory for one source repository
    pub fn repository_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.path.join(name);
        std::fs::create_dir(&dir).map_err(|e| MirrorError::workspace(&dir, e))?;
        Ok(dir)
    }

    /// Delete the run directory and everything cloned into it
    pub fn remove(self) -> Result<()> {
        std::fs::remove_dir_all(&self.path).map_err(|e| MirrorError::workspace(&self.path, e))?;
        debug!("Removed workspace {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    /// Hands out a fixed list of ids, for collision tests
    struct FixedIds(Vec<&'static str>);

    impl RunIdSource for FixedIds {
        fn next_id(&mut self) -> String {
            self.0.remove(0).to_string()
        }
    }

    #[test]
    fn test_random_run_id_shape() {
        let mut ids = RandomRunId::default();
        let id = ids.next_id();
        assert_eq!(id.len(), 5);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_sequential_run_ids() {
        let mut ids = SequentialRunId::default();
        assert_eq!(ids.next_id(), "run-1");
        assert_eq!(ids.next_id(), "run-2");
    }

    #[test]
    fn test_create_workspace_under_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("repocloner");

        let workspace = Workspace::create(&root, &mut SequentialRunId::default()).unwrap();

        assert_eq!(workspace.path(), root.join("run-1"));
        assert!(workspace.path().is_dir());
    }

    #[test]
    fn test_taken_id_is_skipped() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("taken")).unwrap();

        let mut ids = FixedIds(vec!["taken", "fresh"]);
        let workspace = Workspace::create(temp.path(), &mut ids).unwrap();

        assert_eq!(workspace.path(), temp.path().join("fresh"));
    }

    #[test]
    fn test_repository_dir_is_never_reused() {
        let temp = TempDir::new().unwrap();
        let workspace = Workspace::create(temp.path(), &mut SequentialRunId::default()).unwrap();

        let dir = workspace.repository_dir("alpha").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.file_name().unwrap(), "alpha");

        let err = workspace.repository_dir("alpha").unwrap_err();
        assert_matches!(err, MirrorError::Workspace { .. });
    }

    #[test]
    fn test_remove_deletes_run_directory() {
        let temp = TempDir::new().unwrap();
        let workspace = Workspace::create(temp.path(), &mut SequentialRunId::default()).unwrap();
        let path = workspace.path().to_path_buf();
        workspace.repository_dir("alpha").unwrap();

        workspace.remove().unwrap();
        assert!(!path.exists());
    }
}
