//! Per-key async mutual exclusion.
//!
//! Entries are created on demand and dropped again once no task holds or
//! waits on them, so the table only grows with concurrently contended keys.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    // holders plus waiters
    users: usize,
}

pub struct KeyedLocks<K> {
    entries: Mutex<HashMap<K, Slot>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<K, Slot>> {
        // the table holds no invariants a panicking holder could break
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Waits until no other holder of `key` remains.
    ///
    /// Dropping the returned future before it resolves gives the slot back
    /// just like dropping the guard does.
    pub async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        let mutex = {
            let mut table = self.table();
            let slot = table.entry(key.clone()).or_insert_with(|| Slot {
                mutex: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            slot.mutex.clone()
        };

        let mut guard = KeyedGuard {
            locks: self,
            key,
            guard: None,
        };
        guard.guard = Some(mutex.lock_owned().await);
        guard
    }

    /// Number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        self.table().len()
    }

    fn release(&self, key: &K) {
        let mut table = self.table();
        if let Some(slot) = table.get_mut(key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                table.remove(key);
            }
        }
    }
}

pub struct KeyedGuard<'a, K: Eq + Hash + Clone> {
    locks: &'a KeyedLocks<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.release(&self.key);
    }
}
