use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{KeyValueStore, StorageError};

/// In-memory key-value store.
///
/// An optional quota caps the total bytes of keys plus values, the way
/// browser storage does; a write that would exceed it fails without
/// changing anything.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    /// Stored entries
    entries: Arc<Mutex<HashMap<String, String>>>,

    /// Maximum total size in bytes, if any
    quota_bytes: Option<usize>,
}

impl InMemoryStore {
    /// Create a new unbounded in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an in-memory store that rejects writes beyond `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Total bytes currently used by keys and values
    pub fn usage_bytes(&self) -> Result<usize, StorageError> {
        let entries = self.entries.lock()?;
        Ok(entries.iter().map(|(key, value)| key.len() + value.len()).sum())
    }

    /// Number of stored keys
    pub fn len(&self) -> Result<usize, StorageError> {
        let entries = self.entries.lock()?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock()?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock()?;

        if let Some(quota) = self.quota_bytes {
            let current: usize = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
            let replaced = entries.get(key).map_or(0, |old| key.len() + old.len());
            let required = current - replaced + key.len() + value.len();

            if required > quota {
                debug!("Rejecting write to '{}': {} bytes needed, quota {}", key, required, quota);
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock()?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut entries = self.entries.lock()?;
        entries.clear();
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}
