//! Browser `localStorage` implementation for WebAssembly.

use super::{Storage, StorageError, StorageResult};

/// `window.localStorage`-backed storage.
///
/// Note: This is intentionally not Send/Sync since WASM is single-threaded
/// and `web_sys::Storage` handles are not thread-safe.
pub struct LocalStorage {
    inner: web_sys::Storage,
}

impl LocalStorage {
    /// Bind to the page's `localStorage`.
    pub fn new() -> StorageResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Other("No window object".to_string()))?;
        let inner = window
            .local_storage()
            .map_err(|e| StorageError::Other(format!("localStorage error: {:?}", e)))?
            .ok_or_else(|| StorageError::Other("localStorage not available".to_string()))?;
        Ok(Self { inner })
    }
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> StorageResult<String> {
        self.inner
            .get_item(key)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {:?}", key, e)))?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        // Fails when the origin quota is exceeded.
        self.inner
            .set_item(key, value)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {:?}", key, e)))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner
            .remove_item(key)
            .map_err(|e| StorageError::Io(format!("Failed to delete {}: {:?}", key, e)))
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner
            .get_item(key)
            .map(|v| v.is_some())
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {:?}", key, e)))
    }
}
