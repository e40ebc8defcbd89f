//! Run identifier registry.
//!
//! Maps each upload's task id to its file on disk. An entry moves through
//! two states:
//!
//! ```text
//! insert ─▶ Pending ─claim─▶ Running ─(guard dropped)─▶ removed
//! ```
//!
//! Claiming hands out an [`UploadGuard`] that owns the upload for the rest
//! of the run. Dropping the guard deletes the file and the entry on every
//! exit path, so task ids are single-use. Uploads that are never claimed are
//! removed by [`TaskRegistry::purge_pending`] once they pass their TTL.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown task id: {0}")]
    UnknownTask(Uuid),
    #[error("task already running: {0}")]
    AlreadyClaimed(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Pending,
    Running,
}

#[derive(Debug, Clone)]
struct TaskEntry {
    path: PathBuf,
    state: TaskState,
    created_at: DateTime<Utc>,
}

/// Concurrency-safe task id → upload path store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<Uuid, TaskEntry>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, TaskEntry>> {
        self.tasks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, TaskEntry>> {
        self.tasks.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an uploaded file and return its fresh task id.
    pub fn insert(&self, path: PathBuf) -> Uuid {
        let id = Uuid::new_v4();
        self.write().insert(
            id,
            TaskEntry {
                path,
                state: TaskState::Pending,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn lookup(&self, id: &Uuid) -> Option<PathBuf> {
        self.read().get(id).map(|e| e.path.clone())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Take ownership of a pending upload for one run.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownTask`] if the id was never registered or has
    /// already finished; [`RegistryError::AlreadyClaimed`] if another run
    /// holds it.
    pub fn claim(&self, id: &Uuid) -> Result<UploadGuard, RegistryError> {
        let mut tasks = self.write();
        let entry = tasks.get_mut(id).ok_or(RegistryError::UnknownTask(*id))?;
        if entry.state == TaskState::Running {
            return Err(RegistryError::AlreadyClaimed(*id));
        }
        entry.state = TaskState::Running;
        tracing::debug!(task_id = %id, age = ?(Utc::now() - entry.created_at), "task claimed");
        Ok(UploadGuard {
            registry: self.clone(),
            id: *id,
            path: entry.path.clone(),
        })
    }

    /// Drop pending uploads older than `max_age`, deleting their files.
    /// Claimed entries are left to their guards. Returns how many were
    /// removed.
    pub async fn purge_pending(&self, max_age: chrono::Duration) -> usize {
        let now = Utc::now();
        let stale: Vec<(Uuid, PathBuf)> = {
            let mut tasks = self.write();
            let ids: Vec<Uuid> = tasks
                .iter()
                .filter(|(_, e)| e.state == TaskState::Pending && now - e.created_at >= max_age)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| tasks.remove(&id).map(|e| (id, e.path)))
                .collect()
        };

        for (id, path) in &stale {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    task_id = %id,
                    path = %path.display(),
                    error = %e,
                    "failed to remove expired upload"
                ),
            }
        }
        if !stale.is_empty() {
            tracing::info!(expired = stale.len(), remaining = self.len(), "purged unclaimed uploads");
        }
        stale.len()
    }

    /// Remove an entry, returning its path.
    pub fn release(&self, id: &Uuid) -> Option<PathBuf> {
        self.write().remove(id).map(|e| e.path)
    }
}

/// Exclusive ownership of one upload for the duration of a run.
///
/// On drop the file is deleted and the registry entry removed.
#[derive(Debug)]
pub struct UploadGuard {
    registry: TaskRegistry,
    id: Uuid,
    path: PathBuf,
}

impl UploadGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                task_id = %self.id,
                path = %self.path.display(),
                error = %e,
                "failed to remove upload"
            ),
        }
        self.registry.release(&self.id);
        tracing::debug!(task_id = %self.id, "upload released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "Great job team!!!").unwrap();
        path
    }

    #[test]
    fn claim_is_single_use() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TaskRegistry::new();
        let path = upload(dir.path(), "a.txt");
        let id = registry.insert(path.clone());
        assert_eq!(registry.lookup(&id), Some(path.clone()));

        let guard = registry.claim(&id).unwrap();
        assert_eq!(guard.path(), path.as_path());
        assert_eq!(
            registry.claim(&id).unwrap_err(),
            RegistryError::AlreadyClaimed(id)
        );

        drop(guard);
        assert!(!path.exists());
        assert!(registry.is_empty());
        assert_eq!(
            registry.claim(&id).unwrap_err(),
            RegistryError::UnknownTask(id)
        );
    }

    #[test]
    fn unknown_id_is_rejected() {
        let registry = TaskRegistry::new();
        let id = Uuid::new_v4();
        assert_eq!(
            registry.claim(&id).unwrap_err(),
            RegistryError::UnknownTask(id)
        );
    }

    #[test]
    fn guard_tolerates_missing_file() {
        let registry = TaskRegistry::new();
        let id = registry.insert(PathBuf::from("/nonexistent/upload.txt"));
        drop(registry.claim(&id).unwrap());
        assert!(registry.lookup(&id).is_none());
    }

    #[test]
    fn runs_do_not_touch_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TaskRegistry::new();
        let a = registry.insert(upload(dir.path(), "a.txt"));
        let b = registry.insert(upload(dir.path(), "b.txt"));

        let guard_a = registry.claim(&a).unwrap();
        let guard_b = registry.claim(&b).unwrap();
        assert_ne!(guard_a.path(), guard_b.path());

        drop(guard_a);
        assert!(registry.lookup(&a).is_none());
        assert!(guard_b.path().exists());
        assert_eq!(
            registry.claim(&b).unwrap_err(),
            RegistryError::AlreadyClaimed(b)
        );
    }

    #[tokio::test]
    async fn purge_removes_only_expired_pending_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TaskRegistry::new();
        let pending = upload(dir.path(), "pending.txt");
        let pending_id = registry.insert(pending.clone());
        let running_id = registry.insert(upload(dir.path(), "running.txt"));
        let guard = registry.claim(&running_id).unwrap();

        assert_eq!(registry.purge_pending(chrono::Duration::hours(1)).await, 0);
        assert!(pending.exists());

        assert_eq!(registry.purge_pending(chrono::Duration::zero()).await, 1);
        assert!(!pending.exists());
        assert!(registry.lookup(&pending_id).is_none());
        assert_eq!(
            registry.claim(&pending_id).unwrap_err(),
            RegistryError::UnknownTask(pending_id)
        );

        assert!(guard.path().exists());
        assert_eq!(registry.len(), 1);
        drop(guard);
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_inserts_are_distinct() {
        let registry = TaskRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.insert(PathBuf::from(format!("/tmp/{}", i))))
            })
            .collect();
        let ids: std::collections::HashSet<Uuid> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(registry.len(), 8);
    }
}
