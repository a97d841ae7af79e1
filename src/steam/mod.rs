//! Steam installation discovery
//!
//! Library root enumeration and appmanifest indexing.

pub mod library;
pub mod manifest;
pub mod paths;
pub mod vdf;

pub use library::find_library_roots;
pub use manifest::ManifestIndex;
pub use paths::find_steam_path;
