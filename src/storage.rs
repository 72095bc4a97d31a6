//! Key-value storage capability.
//!
//! [`KeyValueStorage`] abstracts a string-to-string store such as browser
//! local storage. [`MemoryStorage`] is the in-process implementation, and
//! [`PrefixedStorage`] layers typed JSON values and a key namespace on top of
//! any backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{StorageError, StorageResult};

/// String key-value store.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored under `key`.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StorageResult;
    /// Removes `key`. Removing an absent key is a no-op.
    fn remove_item(&self, key: &str) -> StorageResult;
    /// Removes every key.
    fn clear(&self) -> StorageResult;
    /// All stored keys, in no particular order.
    fn keys(&self) -> StorageResult<Vec<String>>;
    /// Number of stored keys.
    fn len(&self) -> StorageResult<usize> {
        Ok(self.keys()?.len())
    }
}

/// In-memory [`KeyValueStorage`]. Clones share the same data.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self
            .data
            .try_lock()
            .map_err(|_| StorageError::ContentionFailure)?;

        Ok(data.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult {
        let mut data = self
            .data
            .try_lock()
            .map_err(|_| StorageError::ContentionFailure)?;

        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult {
        let mut data = self
            .data
            .try_lock()
            .map_err(|_| StorageError::ContentionFailure)?;

        data.remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult {
        let mut data = self
            .data
            .try_lock()
            .map_err(|_| StorageError::ContentionFailure)?;

        data.clear();
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let data = self
            .data
            .try_lock()
            .map_err(|_| StorageError::ContentionFailure)?;

        Ok(data.keys().cloned().collect())
    }

    fn len(&self) -> StorageResult<usize> {
        let data = self
            .data
            .try_lock()
            .map_err(|_| StorageError::ContentionFailure)?;

        Ok(data.len())
    }
}

/// Typed JSON values stored under a key prefix.
///
/// [`clear`](PrefixedStorage::clear) only removes keys carrying this prefix, so
/// several prefixed views can share one backend.
///
/// # Example
///
/// ```rust
/// use pace_guard_core::storage::{MemoryStorage, PrefixedStorage};
///
/// let backend = MemoryStorage::new();
/// let settings = PrefixedStorage::new(backend.clone(), "settings:");
///
/// settings.set("volume", &7u8).unwrap();
/// assert_eq!(settings.get::<u8>("volume").unwrap(), Some(7));
/// assert_eq!(settings.get::<u8>("missing").unwrap(), None);
/// ```
#[derive(Debug, Clone)]
pub struct PrefixedStorage<S> {
    storage: S,
    prefix: String,
}

impl<S: KeyValueStorage> PrefixedStorage<S> {
    /// Wraps `storage`, namespacing every key with `prefix`.
    pub fn new(storage: S, prefix: impl Into<String>) -> Self {
        PrefixedStorage {
            storage,
            prefix: prefix.into(),
        }
    }

    /// The key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Stores `value` as JSON under `prefix + key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult {
        let json = serde_json::to_string(value)?;
        self.storage.set_item(&self.full_key(key), &json)
    }

    /// Reads and decodes the value under `prefix + key`.
    ///
    /// # Returns
    /// * `Ok(Some(value))` - The key exists and decodes as `T`
    /// * `Ok(None)` - The key does not exist
    /// * `Err(StorageError::Serialization)` - The stored text is not valid JSON for `T`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.storage.get_item(&self.full_key(key))? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Removes `prefix + key`.
    pub fn remove(&self, key: &str) -> StorageResult {
        self.storage.remove_item(&self.full_key(key))
    }

    /// Removes every key carrying this prefix and leaves other keys alone.
    pub fn clear(&self) -> StorageResult {
        let mut removed = 0usize;
        for key in self.storage.keys()? {
            if key.starts_with(&self.prefix) {
                self.storage.remove_item(&key)?;
                removed += 1;
            }
        }
        debug!("prefixed storage `{}`: cleared {} key(s)", self.prefix, removed);
        Ok(())
    }
}
