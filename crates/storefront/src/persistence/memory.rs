//! In-process gateway backed by a hash map.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{PersistenceGateway, StorageError};

/// Volatile key-value storage. Never fails.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

}

impl PersistenceGateway for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
