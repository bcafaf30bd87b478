//! Durable "learned" set: topic ids the user marked as reviewed.
//!
//! The set lives in [`Storage`] under [`LEARNED_KEY`]. [`LearnedSet`] keeps a
//! cached copy for cheap `is_learned` checks and replaces it with the stored
//! value whenever a change notification for that key arrives, local or
//! external. Last write wins; concurrent edits are not merged.
//!
//! Storage failures never propagate: reads fall back to the cached (or
//! empty) set and writes keep the in-memory change, logging a warning.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::catalog::TopicId;
use crate::storage::{Storage, Subscription, LEARNED_KEY};

type Cache = Arc<RwLock<BTreeSet<TopicId>>>;

fn read(cache: &Cache) -> RwLockReadGuard<'_, BTreeSet<TopicId>> {
    cache.read().unwrap_or_else(|p| p.into_inner())
}

fn write(cache: &Cache) -> RwLockWriteGuard<'_, BTreeSet<TopicId>> {
    cache.write().unwrap_or_else(|p| p.into_inner())
}

/// Stored value, `Some(empty)` when absent, `None` when storage cannot be read.
fn load_stored(storage: &Storage) -> Option<BTreeSet<TopicId>> {
    match storage.get_json::<Vec<TopicId>>(LEARNED_KEY) {
        Ok(ids) => Some(ids.unwrap_or_default().into_iter().collect()),
        Err(e) => {
            warn!(error = %e, "cannot read learned topics; keeping current state");
            None
        }
    }
}

pub struct LearnedSet {
    storage: Storage,
    cache: Cache,
    _subscription: Subscription,
}

impl LearnedSet {
    /// Load the set from `storage` and start following its change notifications.
    pub fn new(storage: Storage) -> Self {
        let cache: Cache = Arc::new(RwLock::new(load_stored(&storage).unwrap_or_default()));

        let follower_storage = storage.clone();
        let follower_cache = cache.clone();
        let subscription = storage.subscribe(move |event| {
            if event.key != LEARNED_KEY {
                return;
            }
            if let Some(fresh) = load_stored(&follower_storage) {
                debug!(origin = ?event.origin, count = fresh.len(), "learned topics reloaded");
                *write(&follower_cache) = fresh;
            }
        });

        Self { storage, cache, _subscription: subscription }
    }

    pub fn is_learned(&self, id: &str) -> bool {
        read(&self.cache).contains(id)
    }

    /// Flip the learned flag of `id`; returns the new state.
    pub fn toggle_learned(&self, id: &str) -> bool {
        // Start from the stored value so a toggle never resurrects stale state.
        let mut set = load_stored(&self.storage).unwrap_or_else(|| read(&self.cache).clone());
        let now_learned = if set.remove(id) {
            false
        } else {
            set.insert(id.to_string());
            true
        };
        *write(&self.cache) = set.clone();
        self.persist(&set);
        now_learned
    }

    pub fn clear_all_learned(&self) {
        write(&self.cache).clear();
        if let Err(e) = self.storage.remove(LEARNED_KEY) {
            warn!(error = %e, "cannot clear stored learned topics; cleared in memory only");
        }
    }

    /// Learned ids, sorted.
    pub fn learned_ids(&self) -> Vec<TopicId> {
        read(&self.cache).iter().cloned().collect()
    }

    pub fn learned_count(&self) -> usize {
        read(&self.cache).len()
    }

    fn persist(&self, set: &BTreeSet<TopicId>) {
        let ids: Vec<&TopicId> = set.iter().collect();
        if let Err(e) = self.storage.set_json(LEARNED_KEY, &ids) {
            warn!(error = %e, "cannot persist learned topics; change kept in memory only");
        }
    }
}
