//! protonhook - Proton prefix configurator for DLL-based loaders
//!
//! Library crate: finds a Steam game's install directory, works out which
//! Proton build the game actually runs under, and sets the winhttp DLL
//! override inside the game's Wine prefix so a loader DLL gets picked up.

pub mod api;
pub mod cache;
pub mod error;
pub mod logging;
pub mod proton;
pub mod steam;

pub use api::{apply_runtime_override, resolve_game_install_dir};
