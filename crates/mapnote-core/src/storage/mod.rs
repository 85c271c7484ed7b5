//! Storage abstraction for persistence.
//!
//! A storage backend is a flat key-value store of text payloads. The map keeps
//! its whole feature collection under a single key.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for key-value storage backends.
///
/// Calls are synchronous: browser `localStorage` is, and file slots are small.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Read the payload stored under `key`.
    fn get(&self, key: &str) -> StorageResult<String>;

    /// Replace the payload stored under `key`.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Check if `key` holds a payload.
    fn exists(&self, key: &str) -> StorageResult<bool>;
}

/// Trait for key-value storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Read the payload stored under `key`.
    fn get(&self, key: &str) -> StorageResult<String>;

    /// Replace the payload stored under `key`.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Check if `key` holds a payload.
    fn exists(&self, key: &str) -> StorageResult<bool>;
}

/// Convenience type alias for platform-specific storage.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformStorage = FileStorage;

#[cfg(target_arch = "wasm32")]
pub type PlatformStorage = LocalStorage;

/// Create a platform-appropriate storage backend.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<PlatformStorage> {
    FileStorage::default_location()
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_storage() -> StorageResult<PlatformStorage> {
    LocalStorage::new()
}
