//! MapNote Render Library
//!
//! Renderer abstraction and implementations for MapNote.
//! The default implementation uses Vello for GPU-accelerated rendering.

mod renderer;
pub mod tiles;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
pub use tiles::{TileCache, TileEntry, decode_tile};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
