//! Per-key async locking.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

/// Per-key async mutex.
///
/// Work on different keys runs concurrently while work on the same key is
/// serialized in lock acquisition order. Entries are kept for the life of the
/// map, matching the lifetime of the sessions they guard.
///
/// ```ignore
/// let locks = KeyedLocks::new();
/// let lock = locks.get("telegram\042\07");
/// let _guard = lock.lock().await;
/// // another locks.get(same key).lock().await waits here
/// ```
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the lock for `key`.
    pub fn get(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
