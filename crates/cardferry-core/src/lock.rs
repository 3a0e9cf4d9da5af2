//! Per-project mutual exclusion for the duplicate-check-then-create step.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Async locks keyed by destination project id.
///
/// Two imports into the same project must not interleave, or both could
/// decide "no match" and create duplicates. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct ProjectLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `project_id`.
    pub async fn lock(&self, project_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(project_id).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_project_is_exclusive() {
        let locks = ProjectLocks::new();
        let guard = locks.lock(7).await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = other.lock(7).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.expect("waiter joins");
    }

    #[tokio::test]
    async fn different_projects_do_not_block() {
        let locks = ProjectLocks::new();
        let _a = locks.lock(1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(2)).await;
        assert!(b.is_ok());
    }
}
