//! # Snapshot Store
//!
//! Keeps projects by id. [`FileSnapshotStore`] writes one `<uuid>.emb`
//! per project into a directory, taking the file lock for each save;
//! [`MemorySnapshotStore`] keeps them in a map for tests and embedding.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::project::Project;
//! use carbon_core::store::{MemorySnapshotStore, SnapshotStore};
//!
//! let store = MemorySnapshotStore::default();
//! let project = Project::new("Harbour Offices", "26-014", "J. Assessor");
//! store.save(&project).unwrap();
//!
//! assert_eq!(store.load(&project.meta.id).unwrap(), project);
//! assert_eq!(store.list().unwrap().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult};
use crate::file_io::{load_project, save_project, FileLock};
use crate::project::{Project, PROJECT_EXTENSION};

/// One stored project, as listed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: Uuid,
    pub name: String,
    pub job_id: String,
    pub modified: DateTime<Utc>,
}

impl From<&Project> for SnapshotSummary {
    fn from(project: &Project) -> Self {
        SnapshotSummary {
            id: project.meta.id,
            name: project.meta.name.clone(),
            job_id: project.meta.job_id.clone(),
            modified: project.meta.modified,
        }
    }
}

/// Persistence keyed by `Project::meta.id`.
pub trait SnapshotStore: Send + Sync {
    /// Insert or replace the project stored under its id
    fn save(&self, project: &Project) -> CalcResult<()>;

    fn load(&self, id: &Uuid) -> CalcResult<Project>;

    /// Stored projects ordered by id
    fn list(&self) -> CalcResult<Vec<SnapshotSummary>>;
}

fn not_found(id: &Uuid) -> CalcError {
    CalcError::file_error("load snapshot", id.to_string(), "no snapshot with this id")
}

// ============================================================================
// Directory store
// ============================================================================

pub struct FileSnapshotStore {
    root: PathBuf,
    user_id: String,
}

impl FileSnapshotStore {
    /// Store rooted at `root`, created if missing. `user_id` is recorded in locks.
    pub fn open(root: impl Into<PathBuf>, user_id: impl Into<String>) -> CalcResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| CalcError::file_error("create store", root.display().to_string(), e.to_string()))?;
        Ok(FileSnapshotStore {
            root,
            user_id: user_id.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &Uuid) -> PathBuf {
        self.root.join(format!("{id}.{PROJECT_EXTENSION}"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, project: &Project) -> CalcResult<()> {
        let path = self.path_for(&project.meta.id);
        let _lock = FileLock::acquire(&path, self.user_id.as_str())?;
        save_project(project, &path)
    }

    fn load(&self, id: &Uuid) -> CalcResult<Project> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(not_found(id));
        }
        load_project(&path)
    }

    fn list(&self) -> CalcResult<Vec<SnapshotSummary>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| CalcError::file_error("list store", self.root.display().to_string(), e.to_string()))?;

        let mut summaries = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| CalcError::file_error("list store", self.root.display().to_string(), e.to_string()))?
                .path();
            if path.extension().and_then(|s| s.to_str()) != Some(PROJECT_EXTENSION) {
                continue;
            }
            match load_project(&path) {
                Ok(project) => summaries.push(SnapshotSummary::from(&project)),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable snapshot"),
            }
        }
        summaries.sort_by_key(|s| s.id);
        Ok(summaries)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
pub struct MemorySnapshotStore {
    projects: Mutex<BTreeMap<Uuid, Project>>,
}

impl MemorySnapshotStore {
    fn projects(&self) -> CalcResult<std::sync::MutexGuard<'_, BTreeMap<Uuid, Project>>> {
        self.projects.lock().map_err(|_| CalcError::Internal {
            message: "snapshot store mutex poisoned".to_string(),
        })
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, project: &Project) -> CalcResult<()> {
        self.projects()?.insert(project.meta.id, project.clone());
        Ok(())
    }

    fn load(&self, id: &Uuid) -> CalcResult<Project> {
        self.projects()?.get(id).cloned().ok_or_else(|| not_found(id))
    }

    fn list(&self) -> CalcResult<Vec<SnapshotSummary>> {
        Ok(self.projects()?.values().map(SnapshotSummary::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_save_load_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path().join("snapshots"), "assessor@example.com").unwrap();

        let first = Project::new("First", "J-1", "A");
        let second = Project::new("Second", "J-2", "A");
        store.save(&first).unwrap();
        store.save(&second).unwrap();

        assert_eq!(store.load(&second.meta.id).unwrap(), second);
        assert!(!store.path_for(&first.meta.id).with_extension("emb.lock").exists());

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].id < listed[1].id);
    }

    #[test]
    fn test_file_store_overwrites_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path(), "a").unwrap();

        let mut project = Project::new("Draft", "J-1", "A");
        store.save(&project).unwrap();
        project.meta.name = "Final".to_string();
        store.save(&project).unwrap();

        assert_eq!(store.load(&project.meta.id).unwrap().meta.name, "Final");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_skips_foreign_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path(), "a").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("broken.emb"), "{").unwrap();
        store.save(&Project::default()).unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path(), "a").unwrap();
        let err = store.load(&Uuid::new_v4()).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");

        let memory = MemorySnapshotStore::default();
        assert!(memory.load(&Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_locked_snapshot_cannot_be_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path(), "second").unwrap();
        let project = Project::default();

        let _held = FileLock::acquire(&store.path_for(&project.meta.id), "first").unwrap();
        let err = store.save(&project).unwrap_err();
        assert_eq!(err.error_code(), "FILE_LOCKED");
    }
}
