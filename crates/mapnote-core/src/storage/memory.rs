//! In-memory storage implementation.

use super::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage with one slot already filled.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        if let Ok(mut slots) = storage.slots.write() {
            slots.insert(key.to_string(), value.to_string());
        }
        storage
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.slots.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<String> {
        let slots = self.slots.read().map_err(lock_error)?;
        slots
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut slots = self.slots.write().map_err(lock_error)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut slots = self.slots.write().map_err(lock_error)?;
        slots.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        let slots = self.slots.read().map_err(lock_error)?;
        Ok(slots.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let storage = MemoryStorage::new();
        storage.set("features", "{}").unwrap();
        assert_eq!(storage.get("features").unwrap(), "{}");
    }

    #[test]
    fn test_set_replaces() {
        let storage = MemoryStorage::new();
        storage.set("features", "first").unwrap();
        storage.set("features", "second").unwrap();
        assert_eq!(storage.get("features").unwrap(), "second");
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = storage.get("nonexistent");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_remove() {
        let storage = MemoryStorage::with_entry("features", "[]");
        assert!(storage.exists("features").unwrap());
        storage.remove("features").unwrap();
        assert!(!storage.exists("features").unwrap());
        // Removing twice is fine
        storage.remove("features").unwrap();
        assert!(storage.is_empty());
    }
}
