//! Per-key mutual exclusion.
//!
//! Operations on a given payment/lock must be serialized relative to each
//! other (an event-driven withdrawal racing a fail-safe refund for the
//! same lock, a replayed message racing the original) while work on
//! unrelated payments proceeds in parallel.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A lazily populated map of named mutexes.
///
/// Entries are kept for the lifetime of the service; the set of keys is
/// bounded by the set of payments handled, which is persisted anyway.
pub struct KeyedMutex<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedMutex<K> {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the mutex for `key`, creating it on first use.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let mutex = {
            let entry = self.locks.entry(key).or_default();
            Arc::clone(entry.value())
        };
        mutex.lock_owned().await
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedMutex<K> {
    fn default() -> Self {
        Self::new()
    }
}
