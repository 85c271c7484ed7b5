//! MapNote application
//!
//! The application shell: windowing, input translation, tile fetching and
//! the egui overlay around a [`mapnote_core::MapSession`].

mod app;
mod config;
mod event_handler;
mod shortcuts;
mod tile_fetch;
mod ui;

pub use app::{App, AppConfig};
pub use config::{CONFIG_ENV, apply_params, load_map_config, parse_params};
pub use shortcuts::{Shortcut, ShortcutRegistry, command_for_key};
pub use tile_fetch::{TileFetcher, TileResponse};
pub use ui::{MapOverlay, UiAction, UiState, render_ui};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::run_wasm;
