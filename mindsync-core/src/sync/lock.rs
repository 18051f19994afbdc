//! Per-target mutual exclusion
//!
//! Lock order is fixed: a flow takes its branch lock first and the document
//! lock only around load-mutate-store. An entry leaves its map when the last
//! holder releases it.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::target::SyncTarget;

type LockMap<K> = StdMutex<HashMap<K, Arc<Mutex<()>>>>;

#[derive(Debug, Default)]
pub struct SyncLocks {
    branches: LockMap<SyncTarget>,
    documents: LockMap<(String, i64)>,
}

/// Held lock; pruned from its map on drop when nobody else wants it
#[must_use]
pub struct SyncGuard<'a, K: Eq + Hash> {
    map: &'a LockMap<K>,
    key: Option<K>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SyncLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes git work in one working directory
    pub async fn branch(&self, target: &SyncTarget) -> SyncGuard<'_, SyncTarget> {
        acquire(&self.branches, target.clone()).await
    }

    /// Serializes read-modify-write of one stored document
    pub async fn document(&self, domain: &str, mmid: i64) -> SyncGuard<'_, (String, i64)> {
        acquire(&self.documents, (domain.to_string(), mmid)).await
    }
}

async fn acquire<K: Eq + Hash + Clone>(map: &LockMap<K>, key: K) -> SyncGuard<'_, K> {
    let lock = entries(map).entry(key.clone()).or_default().clone();
    let guard = lock.lock_owned().await;
    SyncGuard {
        map,
        key: Some(key),
        guard: Some(guard),
    }
}

/// The map is only touched between awaits, so a poisoned lock still holds
/// consistent data
fn entries<K>(map: &LockMap<K>) -> MutexGuard<'_, HashMap<K, Arc<Mutex<()>>>> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<K: Eq + Hash> Drop for SyncGuard<'_, K> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let Some(key) = self.key.take() else {
            return;
        };
        let mut locks = entries(self.map);
        if locks.get(&key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&key);
        }
    }
}
