//! Change notifications for [`Storage`](super::Storage).
//!
//! A [`ChangeBus`] keeps a list of callbacks. Subscribing returns a
//! [`Subscription`]; dropping it (or calling
//! [`unsubscribe`](Subscription::unsubscribe)) detaches the callback.
//! Callbacks run synchronously on the emitting thread, outside the bus lock,
//! so a callback may itself read storage or subscribe.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Where a change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Written through this process's storage handle.
    Local,
    /// Written by another process sharing the same backend.
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: ChangeOrigin,
}

impl StorageEvent {
    pub fn local(key: &str) -> Self {
        Self { key: key.to_string(), origin: ChangeOrigin::Local }
    }

    pub fn external(key: &str) -> Self {
        Self { key: key.to_string(), origin: ChangeOrigin::External }
    }
}

type Callback = Arc<dyn Fn(&StorageEvent) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

#[derive(Clone, Default)]
pub struct ChangeBus {
    inner: Arc<Mutex<Subscribers>>,
}

/// A poisoned lock only means a callback panicked; the list itself is intact.
fn lock(m: &Mutex<Subscribers>) -> MutexGuard<'_, Subscribers> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StorageEvent) + Send + Sync + 'static,
    {
        let mut subs = lock(&self.inner);
        subs.next_id += 1;
        let id = subs.next_id;
        subs.entries.push((id, Arc::new(callback)));
        Subscription { id, bus: Arc::downgrade(&self.inner) }
    }

    pub fn emit(&self, event: &StorageEvent) {
        let callbacks: Vec<Callback> = lock(&self.inner)
            .entries
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in callbacks {
            cb(event);
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        lock(&self.inner).entries.len()
    }
}

/// Detaches its callback when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    bus: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            lock(&bus).entries.retain(|(id, _)| *id != self.id);
        }
    }
}
