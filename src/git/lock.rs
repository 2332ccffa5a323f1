//! Per-repository operation guard.
//!
//! The working tree, index and `HEAD` are shared mutable state for every git
//! process in a checkout, so at most one operation runs per repository.
//! A mutation fails fast with [`GitError::Busy`] only when another mutation
//! is in flight; behind a read it waits. Reads always wait their turn.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::git::error::{GitError, GitResult};

/// Locks of one repository: `mutation` admits a single mutating operation,
/// `work` serialises every git process
#[derive(Clone)]
struct Locks {
    mutation: Arc<Mutex<()>>,
    work: Arc<Mutex<()>>,
}

// Global locks keyed by repository path
lazy_static::lazy_static! {
    static ref REPOSITORY_LOCKS: Mutex<HashMap<PathBuf, Locks>> =
        Mutex::new(HashMap::new());
}

/// Get or create the locks for a repository
async fn repository_locks(path: &Path) -> Locks {
    let mut locks = REPOSITORY_LOCKS.lock().await;
    locks
        .entry(path.to_path_buf())
        .or_insert_with(|| Locks {
            mutation: Arc::new(Mutex::new(())),
            work: Arc::new(Mutex::new(())),
        })
        .clone()
}

/// Held for the duration of one git operation
pub struct RepositoryGuard {
    // Dropped in declaration order: work first, then the mutation slot
    _work: OwnedMutexGuard<()>,
    _mutation: Option<OwnedMutexGuard<()>>,
}

/// Handle to the operation lock of one repository
#[derive(Debug, Clone)]
pub struct RepositoryLock {
    path: PathBuf,
}

impl RepositoryLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Acquire for a mutating operation.
    ///
    /// Rejected with `Busy` if another mutation is in flight; waits for a
    /// running read to finish.
    pub async fn try_acquire(&self) -> GitResult<RepositoryGuard> {
        let locks = repository_locks(&self.path).await;
        let mutation = match locks.mutation.try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                debug!(path = %self.path.display(), "Another mutation in flight, rejecting operation");
                return Err(GitError::Busy(self.path.clone()));
            }
        };
        Ok(RepositoryGuard {
            _work: locks.work.lock_owned().await,
            _mutation: Some(mutation),
        })
    }

    /// Acquire for a read, waiting for any in-flight operation to finish
    pub async fn acquire(&self) -> RepositoryGuard {
        let locks = repository_locks(&self.path).await;
        RepositoryGuard {
            _work: locks.work.lock_owned().await,
            _mutation: None,
        }
    }

    /// Whether an operation currently holds or awaits the repository
    pub async fn is_busy(&self) -> bool {
        let locks = repository_locks(&self.path).await;
        let busy = locks.mutation.try_lock().is_err() || locks.work.try_lock().is_err();
        busy
    }
}
