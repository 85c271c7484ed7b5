//! Decoded basemap tile cache.

use crate::renderer::{RenderResult, RendererError};
use mapnote_core::tiles::{PlacedTile, TileId};
use peniko::{Blob, ImageAlphaType, ImageData, ImageFormat};
use std::collections::HashMap;
use std::sync::Arc;

/// State of one tile.
#[derive(Debug, Clone)]
pub enum TileEntry {
    /// Requested, bytes not here yet.
    Pending,
    Ready(ImageData),
    /// Fetch or decode failed; not retried.
    Failed,
}

#[derive(Debug, Clone)]
struct Slot {
    entry: TileEntry,
    /// Frame counter value when the tile was last visible.
    last_used: u64,
}

/// Tiles by id, with least-recently-visible eviction.
#[derive(Debug, Clone)]
pub struct TileCache {
    slots: HashMap<TileId, Slot>,
    capacity: usize,
    frame: u64,
}

impl TileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            capacity: capacity.max(1),
            frame: 0,
        }
    }

    /// Mark the visible tiles as used this frame and return the ones that
    /// must be fetched (now marked pending).
    pub fn request(&mut self, visible: &[PlacedTile]) -> Vec<TileId> {
        self.frame += 1;
        let mut missing = Vec::new();
        for tile in visible {
            match self.slots.get_mut(&tile.id) {
                Some(slot) => slot.last_used = self.frame,
                None => {
                    self.slots.insert(
                        tile.id,
                        Slot {
                            entry: TileEntry::Pending,
                            last_used: self.frame,
                        },
                    );
                    missing.push(tile.id);
                }
            }
        }
        self.evict();
        missing
    }

    /// Store fetched bytes. A decode failure marks the tile failed.
    pub fn insert_bytes(&mut self, id: TileId, bytes: &[u8]) -> RenderResult<()> {
        let result = decode_tile(bytes);
        let entry = match &result {
            Ok(image) => TileEntry::Ready(image.clone()),
            Err(_) => TileEntry::Failed,
        };
        self.set(id, entry);
        result.map(|_| ())
    }

    pub fn mark_failed(&mut self, id: TileId) {
        self.set(id, TileEntry::Failed);
    }

    fn set(&mut self, id: TileId, entry: TileEntry) {
        let last_used = self.slots.get(&id).map_or(self.frame, |s| s.last_used);
        self.slots.insert(id, Slot { entry, last_used });
    }

    pub fn get(&self, id: TileId) -> Option<&TileEntry> {
        self.slots.get(&id).map(|s| &s.entry)
    }

    pub fn image(&self, id: TileId) -> Option<&ImageData> {
        match self.get(id)? {
            TileEntry::Ready(image) => Some(image),
            _ => None,
        }
    }

    /// Visible tiles still waiting for bytes, in visibility order.
    pub fn pending(&self, visible: &[PlacedTile]) -> Vec<TileId> {
        visible
            .iter()
            .map(|tile| tile.id)
            .filter(|id| matches!(self.get(*id), Some(TileEntry::Pending)))
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.slots
            .values()
            .filter(|s| matches!(s.entry, TileEntry::Pending))
            .count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget everything, e.g. after switching tile source.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Drop the least recently visible tiles beyond capacity. Tiles visible
    /// in the current frame are never dropped.
    fn evict(&mut self) {
        if self.slots.len() <= self.capacity {
            return;
        }
        let mut candidates: Vec<(u64, TileId)> = self
            .slots
            .iter()
            .filter(|(_, s)| s.last_used < self.frame)
            .map(|(id, s)| (s.last_used, *id))
            .collect();
        candidates.sort_unstable();

        let excess = self.slots.len() - self.capacity;
        for (_, id) in candidates.into_iter().take(excess) {
            self.slots.remove(&id);
        }
        log::trace!("Tile cache holds {} tiles", self.slots.len());
    }
}

/// Decode PNG or JPEG bytes into an RGBA image.
pub fn decode_tile(bytes: &[u8]) -> RenderResult<ImageData> {
    let decoded =
        ::image::load_from_memory(bytes).map_err(|e| RendererError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(ImageData {
        data: Blob::new(Arc::new(rgba.into_vec())),
        format: ImageFormat::Rgba8,
        width,
        height,
        alpha_type: ImageAlphaType::Alpha,
    })
}
