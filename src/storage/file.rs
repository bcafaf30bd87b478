//! `file` store: JSON key-value file shared by every process using the same work dir.
//!
//! File managed in the store directory:
//! - `store.json`: `{ "entries": [ { "key", "value", "ts" }, ... ] }`
//!
//! Every operation re-reads the file, so writes from another process are
//! always visible. A missing file reads as empty and is created on first
//! write.
//!
//! Each write replaces the whole file, so last write wins for the file as a
//! whole, not per key: two processes doing read-modify-write at the same
//! moment on different keys can lose one of the keys. Writes go through a
//! temp file unique to the process and are then renamed into place.
//!
//! The store remembers the contents it last saw. Keys that differ on disk
//! are queued as outside changes, whether noticed by
//! [`poll_changes`](KvStore::poll_changes) or by a local write, and are
//! handed out once by the next poll.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{KvStore, StorageError};

const STORE_FILENAME: &str = "store.json";

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct KvEntry {
    key: String,
    value: String,
    /// RFC 3339 timestamp of the last write.
    ts: String,
}

/// On-disk shape of `store.json`.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct KvFile {
    entries: Vec<KvEntry>,
}

impl KvFile {
    fn snapshot(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect()
    }
}

/// What this process knows about the file.
#[derive(Default)]
struct Seen {
    /// key -> value as last read or written by this process
    snapshot: HashMap<String, String>,
    /// keys changed by someone else, not yet reported
    pending: BTreeSet<String>,
}

impl Seen {
    /// Queue keys that differ between the snapshot and `current`, except
    /// `own_key`, then adopt `current` as the snapshot.
    fn absorb(&mut self, current: HashMap<String, String>, own_key: Option<&str>) {
        let changed = current
            .iter()
            .filter(|(k, v)| self.snapshot.get(*k) != Some(*v))
            .map(|(k, _)| k)
            .chain(self.snapshot.keys().filter(|k| !current.contains_key(*k)))
            .filter(|k| Some(k.as_str()) != own_key)
            .cloned()
            .collect::<Vec<_>>();
        self.pending.extend(changed);
        self.snapshot = current;
    }
}

pub struct FileStore {
    path: PathBuf,
    seen: Mutex<Seen>,
}

impl FileStore {
    /// Open (or lazily create) the store inside `dir`.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)
            .map_err(|e| StorageError::Io(format!("cannot create {}: {e}", dir.display())))?;
        let path = dir.join(STORE_FILENAME);
        let snapshot = Self::read_file(&path)?.snapshot();
        Ok(Self {
            path,
            seen: Mutex::new(Seen { snapshot, pending: BTreeSet::new() }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_seen(&self) -> Result<MutexGuard<'_, Seen>, StorageError> {
        self.seen
            .lock()
            .map_err(|_| StorageError::Unavailable("file store lock poisoned".into()))
    }

    fn read_file(path: &Path) -> Result<KvFile, StorageError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(KvFile::default()),
            Err(e) => return Err(StorageError::Io(format!("cannot read {}: {e}", path.display()))),
        };
        if data.trim().is_empty() {
            return Ok(KvFile::default());
        }
        serde_json::from_str(&data)
            .map_err(|e| StorageError::Serde(format!("malformed {}: {e}", path.display())))
    }

    fn tmp_path(&self) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_extension(format!("json.{}.{seq}.tmp", std::process::id()))
    }

    fn write_file(&self, kv: &KvFile) -> Result<(), StorageError> {
        let data = serde_json::to_string_pretty(kv)
            .map_err(|e| StorageError::Serde(format!("serialise store: {e}")))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, data)
            .map_err(|e| StorageError::Io(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StorageError::Io(format!("cannot replace {}: {e}", self.path.display()))
        })
    }

    /// Read, let `mutate` edit the entries, and write back when it returns `true`.
    /// Outside changes found on the way are queued for the next poll.
    fn update<F>(&self, key: &str, mutate: F) -> Result<bool, StorageError>
    where
        F: FnOnce(&mut KvFile) -> bool,
    {
        let mut kv = Self::read_file(&self.path)?;
        let mut seen = self.lock_seen()?;
        seen.absorb(kv.snapshot(), Some(key));
        if !mutate(&mut kv) {
            return Ok(false);
        }
        self.write_file(&kv)?;
        seen.snapshot = kv.snapshot();
        Ok(true)
    }
}

impl KvStore for FileStore {
    fn store_type(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let kv = Self::read_file(&self.path)?;
        Ok(kv.entries.into_iter().find(|e| e.key == key).map(|e| e.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(key, |kv| {
            kv.entries.retain(|e| e.key != key);
            kv.entries.push(KvEntry {
                key: key.to_string(),
                value: value.to_string(),
                ts: chrono::Utc::now().to_rfc3339(),
            });
            true
        })
        .map(|_| ())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.update(key, |kv| {
            let before = kv.entries.len();
            kv.entries.retain(|e| e.key != key);
            kv.entries.len() < before
        })
    }

    fn poll_changes(&self) -> Result<Vec<String>, StorageError> {
        let current = Self::read_file(&self.path)?.snapshot();
        let mut seen = self.lock_seen()?;
        seen.absorb(current, None);
        Ok(std::mem::take(&mut seen.pending).into_iter().collect())
    }
}
