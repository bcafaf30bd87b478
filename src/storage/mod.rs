//! Durable client storage: pluggable key-value backends plus change events.
//!
//! [`Storage`] is the handle everything else uses. It wraps a [`KvStore`]
//! backend and a [`ChangeBus`]:
//!
//! * local writes through the handle emit [`ChangeOrigin::Local`];
//! * [`Storage::poll_external`] asks the backend which keys another process
//!   changed and emits [`ChangeOrigin::External`] for each.
//!
//! Key layout:
//!
//! ```text
//! learned-topics          JSON array of topic ids
//! chat-history-{topicId}  JSON array of chat messages
//! notes                   JSON array (only its length is surfaced)
//! ```

pub mod events;
pub mod file;
pub mod memory;

pub use events::{ChangeBus, ChangeOrigin, StorageEvent, Subscription};

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

/// Key holding the learned set.
pub const LEARNED_KEY: &str = "learned-topics";
/// Prefix for per-topic chat history keys.
pub const CHAT_HISTORY_PREFIX: &str = "chat-history-";
/// Key holding the notes collection.
pub const NOTES_KEY: &str = "notes";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io: {0}")]
    Io(String),
    #[error("storage serialisation: {0}")]
    Serde(String),
    /// Backend disabled or lost (lock poisoned, quota exhausted…).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Pluggable key-value backend.
///
/// Backends are `Send + Sync` and do blocking I/O. Default
/// [`poll_changes`](KvStore::poll_changes) reports nothing, which suits
/// backends no other process can reach.
pub trait KvStore: Send + Sync {
    /// Backend name for logs (e.g. `"file"`).
    fn store_type(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Returns `true` if the key existed.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// Keys changed by someone else since this backend last looked.
    fn poll_changes(&self) -> Result<Vec<String>, StorageError> {
        Ok(Vec::new())
    }
}

/// Cloneable storage handle: backend plus change notifications.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KvStore>,
    bus: ChangeBus,
}

impl Storage {
    pub fn new(backend: Arc<dyn KvStore>) -> Self {
        Self { backend, bus: ChangeBus::new() }
    }

    /// In-memory storage, for tests and for running without a work dir.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(memory::MemoryStore::new()))
    }

    pub fn store_type(&self) -> &str {
        self.backend.store_type()
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend.get(key)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.backend.set(key, value)?;
        self.bus.emit(&StorageEvent::local(key));
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let existed = self.backend.remove(key)?;
        if existed {
            self.bus.emit(&StorageEvent::local(key));
        }
        Ok(existed)
    }

    /// Read and deserialise a JSON value.
    pub fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Serde(format!("{key}: {e}"))),
        }
    }

    /// Serialise and write a JSON value.
    pub fn set_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Serde(format!("{key}: {e}")))?;
        self.set(key, &raw)
    }

    /// Subscribe to every change notification, local or external.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StorageEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(callback)
    }

    /// Emit an external notification for `key`, for hosts that learn about
    /// outside writes by other means.
    pub fn notify_external(&self, key: &str) {
        self.bus.emit(&StorageEvent::external(key));
    }

    /// Ask the backend for outside writes and notify subscribers.
    ///
    /// Returns the number of changed keys. Backend failures are logged and
    /// count as no change.
    pub fn poll_external(&self) -> usize {
        match self.backend.poll_changes() {
            Ok(keys) => {
                for key in &keys {
                    self.bus.emit(&StorageEvent::external(key));
                }
                keys.len()
            }
            Err(e) => {
                warn!(store = self.store_type(), error = %e, "polling for external changes failed");
                0
            }
        }
    }
}

/// Number of saved notes. Missing, malformed or unreadable data counts as zero.
pub fn notes_count(storage: &Storage) -> usize {
    match storage.get_json::<Vec<serde_json::Value>>(NOTES_KEY) {
        Ok(notes) => notes.map_or(0, |n| n.len()),
        Err(e) => {
            warn!(error = %e, "cannot read notes; reporting none");
            0
        }
    }
}
