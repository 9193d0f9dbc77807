//! Durable key-value storage for the small amount of state that survives a
//! reload (theme, last sidebar item).
//!
//! Values are opaque strings; callers store JSON. [`MemoryStore`] backs
//! tests and ephemeral hosts, [`FileStore`] keeps one file per key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{HearthError, Result};

/// Storage key for the persisted theme id.
pub const THEME_KEY: &str = "theme";
/// Storage key for the persisted dashboard-state blob.
pub const DASHBOARD_STATE_KEY: &str = "dashboard-state";

/// Abstraction over durable key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store: `<dir>/<key>.json`.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(HearthError::Storage(format!("invalid key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let mut store = MemoryStore::new();
        assert!(store.get(THEME_KEY).unwrap().is_none());
        store.set(THEME_KEY, "\"dark\"").unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("\"dark\""));
        assert_eq!(store.len(), 1);
        store.remove(THEME_KEY).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileStore::open(dir.path()).unwrap();
            store
                .set(DASHBOARD_STATE_KEY, r#"{"selectedMenuItem":2}"#)
                .unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get(DASHBOARD_STATE_KEY).unwrap().as_deref(),
            Some(r#"{"selectedMenuItem":2}"#)
        );
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.get("absent").unwrap().is_none());
    }

    #[test]
    fn file_store_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.remove("absent").unwrap();
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        let err = store.set("../escape", "x").unwrap_err();
        assert!(matches!(err, HearthError::Storage(_)));
    }
}
