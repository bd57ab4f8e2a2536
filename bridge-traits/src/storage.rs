//! Token Cache Storage Abstractions
//!
//! Provides the platform-agnostic key-value contract an authentication context
//! persists its cached tokens into, plus an in-process implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{BridgeError, Result};

/// Key-value storage for cached credentials
///
/// Abstracts the storage tier selected by the cache location:
/// - Session: in-process memory that lives as long as the process
/// - Local: persistent storage that survives restarts (Keychain, Credential
///   Manager, Secret Service, browser `localStorage`)
///
/// The API is synchronous. Lookups never suspend and never reach the network.
///
/// # Security Requirements
///
/// Implementations MUST:
/// - Never log or expose stored values
/// - Treat a missing key as `Ok(None)`, not as an error
/// - Make `remove_item` idempotent
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::CacheStorage;
///
/// fn remember(store: &dyn CacheStorage, value: &str) -> Result<()> {
///     store.set_item("access_token:api", value)?;
///     Ok(())
/// }
/// ```
pub trait CacheStorage: Send + Sync {
    /// Read a value
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value
    ///
    /// Succeeds when the key is already absent.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Check if a value exists without reading it
    fn has_item(&self, key: &str) -> Result<bool> {
        Ok(self.get_item(key)?.is_some())
    }

    /// List all keys (without values)
    fn list_keys(&self) -> Result<Vec<String>>;

    /// Remove every stored value
    fn clear(&self) -> Result<()>;
}

/// In-memory [`CacheStorage`]
///
/// Backs the session cache location: entries live for the lifetime of this
/// value and are dropped with it.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> BridgeError {
        BridgeError::OperationFailed("memory storage lock poisoned".to_string())
    }
}

impl CacheStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn has_item(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.contains_key(key))
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.keys().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let store = MemoryStorage::new();
        assert!(store.is_empty());

        store.set_item("k", "v1").unwrap();
        store.set_item("k", "v2").unwrap();

        assert_eq!(store.get_item("k").unwrap(), Some("v2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_storage_missing_key_is_none() {
        let store = MemoryStorage::new();
        assert_eq!(store.get_item("absent").unwrap(), None);
        assert!(!store.has_item("absent").unwrap());
    }

    #[test]
    fn test_memory_storage_remove_is_idempotent() {
        let store = MemoryStorage::new();
        store.set_item("k", "v").unwrap();

        store.remove_item("k").unwrap();
        store.remove_item("k").unwrap();

        assert!(!store.has_item("k").unwrap());
    }

    #[test]
    fn test_memory_storage_list_and_clear() {
        let store = MemoryStorage::new();
        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();

        let mut keys = store.list_keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        store.clear().unwrap();
        assert!(store.is_empty());
    }
}
