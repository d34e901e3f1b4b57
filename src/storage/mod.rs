// Storage module - durable key-value persistence for the login session
//
// The session survives process restarts the same way a browser keeps it in
// local storage: a flat string-to-string map. On disk it is one JSON object
// per file, rewritten synchronously (temp file + rename) on every change so
// a crash never leaves a half-written session behind.
//
// Example: jq '.token' ~/.local/share/shici/session.json

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors raised while persisting keys
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path} is not a JSON object: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value persistence with synchronous writes
pub trait KeyValueStore: Send + Sync {
    /// Read a key, `None` if it was never set or has been removed
    fn get(&self, key: &str) -> Option<String>;

    /// Write a key and persist immediately
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key and persist immediately (no-op if absent)
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed store
// ─────────────────────────────────────────────────────────────────────────────

/// Key-value store persisted as a JSON object on disk
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// A missing file is an empty store. The file and its parent directory
    /// are only created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| StorageError::Json {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        tracing::debug!("Opened session store {:?} ({} keys)", path, entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the backing file from `entries`
    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;

        // Write next to the target, then rename over it
        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.commit(&mut entries, next)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.commit(&mut entries, next)
    }
}

impl FileStore {
    /// Replace the in-memory map only once `next` is on disk
    fn commit(
        &self,
        entries: &mut BTreeMap<String, String>,
        next: BTreeMap<String, String>,
    ) -> Result<(), StorageError> {
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Non-persistent store, used by tests and one-shot invocations
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is currently present
    pub fn contains(&self, key: &str) -> bool {
        lock(&self.entries).contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested").join("session.json")).unwrap();

        assert_eq!(store.get("token"), None);
        // Nothing written until the first set
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open(&path).unwrap();
        store.set("token", "abc").unwrap();
        store.set("currentUser", r#"{"id":1}"#).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("token").as_deref(), Some("abc"));
        assert_eq!(reopened.get("currentUser").as_deref(), Some(r#"{"id":1}"#));
    }

    #[test]
    fn test_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open(&path).unwrap();
        store.set("token", "abc").unwrap();
        store.remove("token").unwrap();
        // Removing an absent key is fine
        store.remove("token").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("token"), None);
        assert!(!dir.path().join("session.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStore::open(&path).err().expect("corrupt file should fail");
        assert!(matches!(err, StorageError::Json { .. }));
    }

    /// Turn the store's parent directory into a plain file so writes fail
    fn block_parent(store: &FileStore) {
        let parent = store.path().parent().unwrap();
        if parent.exists() {
            fs::remove_dir_all(parent).unwrap();
        }
        fs::write(parent, "in the way").unwrap();
    }

    #[test]
    fn test_failed_set_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("sub").join("session.json")).unwrap();
        block_parent(&store);

        let err = store.set("token", "x").unwrap_err();

        assert!(matches!(err, StorageError::Io { .. }));
        assert_eq!(store.get("token"), None);
    }

    #[test]
    fn test_failed_remove_keeps_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("sub").join("session.json")).unwrap();
        store.set("token", "abc").unwrap();
        block_parent(&store);

        assert!(store.remove("token").is_err());
        assert_eq!(store.get("token").as_deref(), Some("abc"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("token", "t").unwrap();
        assert!(store.contains("token"));
        store.remove("token").unwrap();
        assert!(!store.contains("token"));
    }
}
