//! The key-value storage seam.
//!
//! The browser build keeps its identity in `localStorage`. Here the same job
//! is done by anything implementing [`KeyValueStore`]: an in-memory map for
//! tests and throwaway bots, or a JSON file for anything that should keep its
//! identity across runs.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::SessionError;

/// String-to-string storage.
///
/// # Example
///
/// ```rust
/// use spacecats_session::{KeyValueStore, MemoryStore};
///
/// let mut store = MemoryStore::default();
/// store.set("playerId", "player_1").unwrap();
/// assert_eq!(store.get("playerId").unwrap().as_deref(), Some("player_1"));
/// ```
pub trait KeyValueStore {
    /// Returns the value for `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError>;
}

/// A store that forgets everything when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A store backed by a single JSON object on disk.
///
/// The whole file is read on open and rewritten on every `set`; identity
/// data is a handful of keys, so there's nothing to gain from anything
/// cleverer.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`. A missing file is an empty store; the file
    /// is created on the first `set`.
    ///
    /// # Errors
    /// - [`SessionError::Storage`] if the file exists but can't be read
    /// - [`SessionError::Corrupt`] if it isn't a JSON object of strings
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let entries: BTreeMap<String, String> = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries.insert(key.to_string(), value.to_string());
        let text = serde_json::to_string_pretty(&self.entries)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A unique scratch path under the system temp dir.
    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("spacecats-store-{}-{}", std::process::id(), crate::random_suffix()))
            .join(name)
    }

    #[test]
    fn test_memory_store_get_missing_is_none() {
        let store = MemoryStore::default();
        assert_eq!(store.get("nope").unwrap(), None);
    }

    #[test]
    fn test_memory_store_set_replaces() {
        let mut store = MemoryStore::default();
        store.set("k", "a").unwrap();
        store.set("k", "b").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let store = FileStore::open(scratch_path("absent.json")).unwrap();
        assert_eq!(store.get("playerId").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let path = scratch_path("identity.json");
        let mut store = FileStore::open(&path).unwrap();
        store.set("playerId", "player_1").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("playerId").unwrap().as_deref(), Some("player_1"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let path = scratch_path("corrupt.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, SessionError::Corrupt(_)));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
