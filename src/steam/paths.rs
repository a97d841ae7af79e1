//! Steam path detection
//!
//! Locates the primary Steam installation across native, Flatpak, and Snap
//! layouts.

use std::path::PathBuf;

/// Steam locations to check, relative to the home directory.
const STEAM_PATHS: &[&str] = &[
    ".steam/steam",
    ".local/share/Steam",
    ".var/app/com.valvesoftware.Steam/.steam/steam",
    "snap/steam/common/.steam/steam",
];

/// Find the Steam installation path.
///
/// Returns `None` if no known location exists.
#[must_use]
pub fn find_steam_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;

    STEAM_PATHS
        .iter()
        .map(|rel| home.join(rel))
        .find(|p| p.exists())
}
