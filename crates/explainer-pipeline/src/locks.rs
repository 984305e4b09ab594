//! Per-project single-flight locks.
//!
//! At most one background task may work on a project at a time. A task
//! holds a [`ProjectLockGuard`] for its whole lifetime; dropping the guard,
//! whether the task succeeded, failed or panicked, frees the project.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Set of projects with a task in flight.
#[derive(Debug, Clone, Default)]
pub struct ProjectLocks {
    active: Arc<Mutex<HashSet<i64>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a project, or `None` if a task already holds it.
    pub fn try_acquire(&self, project_id: i64) -> Option<ProjectLockGuard> {
        if self.set().insert(project_id) {
            Some(ProjectLockGuard {
                locks: self.clone(),
                project_id,
            })
        } else {
            None
        }
    }

    pub fn is_locked(&self, project_id: i64) -> bool {
        self.set().contains(&project_id)
    }

    fn set(&self) -> MutexGuard<'_, HashSet<i64>> {
        // The set stays consistent even if a holder panicked mid-insert
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases its project when dropped.
#[derive(Debug)]
pub struct ProjectLockGuard {
    locks: ProjectLocks,
    project_id: i64,
}

impl ProjectLockGuard {
    pub fn project_id(&self) -> i64 {
        self.project_id
    }
}

impl Drop for ProjectLockGuard {
    fn drop(&mut self) {
        self.locks.set().remove(&self.project_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let locks = ProjectLocks::new();
        let guard = locks.try_acquire(1).unwrap();
        assert!(locks.try_acquire(1).is_none());
        assert!(locks.try_acquire(2).is_some());
        assert!(locks.is_locked(1));

        drop(guard);
        assert!(!locks.is_locked(1));
        assert!(locks.try_acquire(1).is_some());
    }

    #[tokio::test]
    async fn test_released_when_task_panics() {
        let locks = ProjectLocks::new();
        let guard = locks.try_acquire(9).unwrap();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("task blew up");
        });
        assert!(handle.await.is_err());
        assert!(!locks.is_locked(9));
    }
}
