//! `memory` store: ephemeral in-memory key-value store.
//!
//! Data is discarded when the process exits. Used as the test fake and as
//! the fallback when no durable backend can be opened.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{KvStore, StorageError};

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
    /// When set, every operation fails. Simulates disabled storage.
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation returns [`StorageError::Unavailable`].
    pub fn unavailable() -> Self {
        Self { data: Mutex::new(HashMap::new()), failing: true }
    }

    fn data(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        if self.failing {
            return Err(StorageError::Unavailable("storage disabled".into()));
        }
        self.data
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))
    }
}

impl KvStore for MemoryStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.data()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.data()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.data()?.remove(key).is_some())
    }
}
