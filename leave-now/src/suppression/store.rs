//! Backing stores for dismissal timestamps.
//!
//! Keys are `lastDismiss.<category>`, values are epoch milliseconds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::error::SuppressionError;

/// Key/value storage for dismissal timestamps.
pub trait SuppressionStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<i64>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: i64) -> Result<(), SuppressionError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), SuppressionError>;
}

impl<T: SuppressionStore + ?Sized> SuppressionStore for Box<T> {
    fn get(&self, key: &str) -> Option<i64> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: i64) -> Result<(), SuppressionError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), SuppressionError> {
        (**self).remove(key)
    }
}

/// In-process store. Records are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySuppressionStore {
    values: Mutex<BTreeMap<String, i64>>,
}

impl MemorySuppressionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SuppressionStore for MemorySuppressionStore {
    fn get(&self, key: &str) -> Option<i64> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).copied()
    }

    fn set(&self, key: &str, value: i64) -> Result<(), SuppressionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SuppressionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Store persisted as a flat JSON object on disk.
///
/// The whole file is rewritten on every change; it holds at most one entry
/// per alert category. A change that fails to reach disk is not applied.
#[derive(Debug)]
pub struct JsonFileSuppressionStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, i64>>,
}

impl JsonFileSuppressionStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts an empty store. An unreadable or corrupt file
    /// is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SuppressionError> {
        let path = path.into();

        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| SuppressionError::Json {
                    message: format!("failed to parse {}: {}", path.display(), e),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(SuppressionError::Io {
                    message: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Get the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, i64>) -> Result<(), SuppressionError> {
        // Create parent directories if needed
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| SuppressionError::Io {
                message: format!("failed to create store directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(values).map_err(|e| SuppressionError::Json {
            message: format!("failed to serialize store: {}", e),
        })?;

        std::fs::write(&self.path, json).map_err(|e| SuppressionError::Io {
            message: format!("failed to write store file: {}", e),
        })
    }
}

impl SuppressionStore for JsonFileSuppressionStore {
    fn get(&self, key: &str) -> Option<i64> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).copied()
    }

    fn set(&self, key: &str, value: i64) -> Result<(), SuppressionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = values.clone();
        updated.insert(key.to_string(), value);
        self.persist(&updated)?;
        *values = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SuppressionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut updated = values.clone();
        updated.remove(key);
        self.persist(&updated)?;
        *values = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemorySuppressionStore::new();
        assert_eq!(store.get("lastDismiss.bus"), None);

        store.set("lastDismiss.bus", 1_000).unwrap();
        assert_eq!(store.get("lastDismiss.bus"), Some(1_000));

        store.set("lastDismiss.bus", 2_000).unwrap();
        assert_eq!(store.get("lastDismiss.bus"), Some(2_000));

        store.remove("lastDismiss.bus").unwrap();
        assert_eq!(store.get("lastDismiss.bus"), None);
        store.remove("lastDismiss.bus").unwrap();
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suppression.json");

        let store = JsonFileSuppressionStore::open(&path).unwrap();
        store.set("lastDismiss.bus", 1_700_000_000_000).unwrap();
        store.set("lastDismiss.persistent", 1).unwrap();
        drop(store);

        let reopened = JsonFileSuppressionStore::open(&path).unwrap();
        assert_eq!(reopened.get("lastDismiss.bus"), Some(1_700_000_000_000));
        assert_eq!(reopened.get("lastDismiss.persistent"), Some(1));
    }

    #[test]
    fn file_store_remove_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suppression.json");

        let store = JsonFileSuppressionStore::open(&path).unwrap();
        store.set("lastDismiss.weather", 5).unwrap();
        store.remove("lastDismiss.weather").unwrap();
        drop(store);

        let reopened = JsonFileSuppressionStore::open(&path).unwrap();
        assert_eq!(reopened.get("lastDismiss.weather"), None);
    }

    /// Turn the store's directory into a plain file so writes fail.
    fn block_writes(dir: &Path) {
        std::fs::remove_dir_all(dir).unwrap();
        std::fs::write(dir, "not a directory").unwrap();
    }

    #[test]
    fn failed_write_changes_nothing() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        let store = JsonFileSuppressionStore::open(sub.join("suppression.json")).unwrap();
        store.set("lastDismiss.weather", 5).unwrap();

        block_writes(&sub);

        assert!(matches!(
            store.set("lastDismiss.bus", 1),
            Err(SuppressionError::Io { .. })
        ));
        assert_eq!(store.get("lastDismiss.bus"), None);

        assert!(store.remove("lastDismiss.weather").is_err());
        assert_eq!(store.get("lastDismiss.weather"), Some(5));
    }

    #[test]
    fn failed_dismissal_does_not_mute() {
        use crate::suppression::{Category, SuppressionGate};
        use chrono::Utc;

        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        let store = JsonFileSuppressionStore::open(sub.join("suppression.json")).unwrap();
        store.set("lastDismiss.weather", 5).unwrap();
        block_writes(&sub);

        let gate = SuppressionGate::new(store);
        let now = Utc::now();

        assert!(gate.dismiss(Category::Bus, now).is_err());
        assert!(!gate.is_suppressed(Category::Bus, now));
        assert!(gate.last_dismissed(Category::Bus).is_none());
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileSuppressionStore::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.get("lastDismiss.bus"), None);
    }

    #[test]
    fn corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suppression.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFileSuppressionStore::open(&path).unwrap_err();
        assert!(matches!(err, SuppressionError::Json { .. }));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("suppression.json");

        let store = JsonFileSuppressionStore::open(&path).unwrap();
        store.set("lastDismiss.bus", 1).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }
}
