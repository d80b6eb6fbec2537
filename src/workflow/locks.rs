use crate::document::DocKey;
use ahash::AHashSet;
use std::sync::{Condvar, Mutex, PoisonError};
use tracing::debug;

/// In-process mutual exclusion per tracking source.
///
/// Two documents drawing from the same source cannot interleave their validate and write
/// steps while each holds the guard for that source. Locking across processes stays with the
/// host store.
#[derive(Debug, Default)]
pub struct TrackingLocks {
    held: Mutex<AHashSet<DocKey>>,
    released: Condvar,
}

impl TrackingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until `key` is free, then holds it until the guard is dropped.
    pub fn acquire(&self, key: DocKey) -> TrackingGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(&key) {
            debug!("Waiting for tracking lock on {}", key);
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(key.clone());
        TrackingGuard { locks: self, key }
    }

    pub fn is_held(&self, key: &DocKey) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Releases its tracking lock on drop.
#[derive(Debug)]
pub struct TrackingGuard<'a> {
    locks: &'a TrackingLocks,
    key: DocKey,
}

impl TrackingGuard<'_> {
    pub fn key(&self) -> &DocKey {
        &self.key
    }
}

impl Drop for TrackingGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.key);
        self.locks.released.notify_all();
    }
}
