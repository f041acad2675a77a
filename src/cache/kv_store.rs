//! Synchronous string key-value stores backing the local session cache.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::errors::AppError;

/// Fallible local key-value storage. Callers decide whether a failure matters.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// One file per key inside `dir`.
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Bytes outside `[A-Za-z0-9_-]` are written as `%XX`, so distinct keys
    /// never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for b in key.bytes() {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
                name.push(char::from(b));
            } else {
                name.push_str(&format!("%{b:02X}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Persistence(format!("read {key}: {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::Persistence(format!("create {}: {e}", self.dir.display())))?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| AppError::Persistence(format!("write {key}: {e}")))?;
        fs::rename(&tmp, &path).map_err(|e| AppError::Persistence(format!("rename {key}: {e}")))
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Persistence(format!("remove {key}: {e}"))),
        }
    }
}

#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::Persistence("memory store poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("cache"));

        assert_eq!(store.get("chat_session_medusa").unwrap(), None);
        store.set("chat_session_medusa", "{\"a\":1}").unwrap();
        assert_eq!(store.get("chat_session_medusa").unwrap().as_deref(), Some("{\"a\":1}"));

        store.remove("chat_session_medusa").unwrap();
        assert_eq!(store.get("chat_session_medusa").unwrap(), None);
        // second remove is a no-op
        store.remove("chat_session_medusa").unwrap();
    }

    #[test]
    fn file_store_escapes_keys_into_file_names() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        store.set("../escape/key", "x").unwrap();
        assert!(dir.path().join("%2E%2E%2Fescape%2Fkey.json").exists());
    }

    #[test]
    fn file_store_keeps_similar_keys_apart() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        store.set("a.b", "dot").unwrap();
        store.set("a_b", "underscore").unwrap();
        store.set("a%2Eb", "escaped").unwrap();

        assert_eq!(store.get("a.b").unwrap().as_deref(), Some("dot"));
        assert_eq!(store.get("a_b").unwrap().as_deref(), Some("underscore"));
        assert_eq!(store.get("a%2Eb").unwrap().as_deref(), Some("escaped"));
    }

    #[test]
    fn file_store_reports_unwritable_directory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();
        let store = FileKeyValueStore::new(&blocker);
        assert!(matches!(store.set("k", "v"), Err(AppError::Persistence(_))));
    }
}
