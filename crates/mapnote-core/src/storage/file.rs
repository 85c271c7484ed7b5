//! One file per storage key, for native builds.

use super::{Storage, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Stores each key as `<key>.geojson` under a base directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Use `base_path`, creating it when missing.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// `mapnote/` under the platform's local data directory.
    ///
    /// On Linux: `~/.local/share/mapnote/`
    /// On macOS: `~/Library/Application Support/mapnote/`
    /// On Windows: `%LOCALAPPDATA%\mapnote\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("mapnote"))
    }

    /// Get the file path for a key.
    fn slot_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.geojson", safe_key))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> StorageResult<String> {
        let path = self.slot_path(key);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::Io(format!("Failed to read {}: {}", path.display(), e)),
        })
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.slot_path(key);
        // Write to a sibling file first so a crash never leaves a half-written slot.
        let tmp = path.with_extension("geojson.tmp");
        fs::write(&tmp, value)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.slot_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.slot_path(key).is_file())
    }
}
