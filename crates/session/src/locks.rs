//! Per-user critical sections.
//!
//! Routing on a pending action and mutating it are read-modify-write steps
//! on the user's session; holding the user's lock across the whole turn
//! keeps two messages from the same user from interleaving.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Entries beyond this count trigger eviction of idle locks.
const EVICT_THRESHOLD: usize = 10_000;

#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock for `user`. Released when the guard drops.
    pub async fn acquire(&self, user: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

            if locks.len() > EVICT_THRESHOLD {
                // Only the map holds idle locks.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }

            locks
                .entry(user.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of users with a lock entry.
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
