//! Persistence bridge between the feature collection and a storage slot.
//!
//! The whole collection lives under one key and is replaced wholesale on
//! every save.

use crate::collection::FeatureCollection;
use crate::config::MapConfig;
use crate::geojson::{self, GeoJsonError};
use crate::projection::Crs;
use crate::storage::{PlatformStorage, Storage, StorageError, StorageResult, create_default_storage};
use std::sync::Arc;

/// Result of reading the storage slot.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Nothing stored yet.
    Empty,
    /// Stored features, in stored order.
    Restored(FeatureCollection),
    /// Something is stored but it is not GeoJSON we understand.
    Corrupt(GeoJsonError),
}

/// Reads and writes the feature collection under a single storage key.
pub struct Persistence<S: Storage> {
    /// Storage backend.
    storage: Arc<S>,
    key: String,
    crs: Crs,
}

impl<S: Storage> Persistence<S> {
    pub fn new(storage: Arc<S>, key: impl Into<String>, crs: Crs) -> Self {
        Self {
            storage,
            key: key.into(),
            crs,
        }
    }

    pub fn from_config(storage: Arc<S>, config: &MapConfig) -> Self {
        Self::new(storage, config.storage_key.clone(), config.storage_crs)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Encode the collection and replace the slot's content.
    pub fn save(&mut self, collection: &FeatureCollection) -> StorageResult<()> {
        let payload = geojson::encode(collection, self.crs)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set(&self.key, &payload)?;
        log::debug!("Saved {} features to '{}'", collection.len(), self.key);
        Ok(())
    }

    /// Read the slot. Only backend failures are errors; a bad payload is
    /// reported as [`LoadOutcome::Corrupt`].
    pub fn load(&self) -> StorageResult<LoadOutcome> {
        let payload = match self.storage.get(&self.key) {
            Ok(p) => p,
            Err(StorageError::NotFound(_)) => return Ok(LoadOutcome::Empty),
            Err(e) => return Err(e),
        };
        if payload.trim().is_empty() {
            return Ok(LoadOutcome::Empty);
        }
        Ok(match geojson::decode(&payload, self.crs) {
            Ok(collection) => LoadOutcome::Restored(collection),
            Err(e) => LoadOutcome::Corrupt(e),
        })
    }

}

/// Type alias for persistence with platform-specific storage.
pub type PlatformPersistence = Persistence<PlatformStorage>;

/// Convenience function to create persistence backed by the default storage.
pub fn create_persistence(config: &MapConfig) -> StorageResult<PlatformPersistence> {
    let storage = Arc::new(create_default_storage()?);
    Ok(Persistence::from_config(storage, config))
}
