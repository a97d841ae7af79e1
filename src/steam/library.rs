//! Steam library root enumeration
//!
//! A Steam install can spread games across several library folders. The
//! primary root always counts as a library; additional roots come from
//! steamapps/libraryfolders.vdf under it.

use std::fs;
use std::path::{Path, PathBuf};

use super::vdf;
use crate::logging::{log_info, log_warning};

/// Enumerate all library roots for a Steam installation.
///
/// Returns the primary root first, then every path listed in
/// libraryfolders.vdf in file order, deduplicated and filtered to
/// directories that still exist. A missing descriptor just means a single
/// library.
#[must_use]
pub fn find_library_roots(primary: &Path) -> Vec<PathBuf> {
    let mut roots = vec![primary.to_path_buf()];

    let descriptor = primary.join("steamapps/libraryfolders.vdf");
    match fs::read_to_string(&descriptor) {
        Ok(content) => {
            for raw in vdf::extract_values(&content, "path") {
                // Windows-style escaped backslashes show up in some descriptors
                let path = PathBuf::from(raw.replace("\\\\", "/"));
                if path.is_dir() && !roots.contains(&path) {
                    roots.push(path);
                }
            }
        }
        Err(e) if descriptor.exists() => {
            log_warning(&format!("Could not read {}: {}", descriptor.display(), e));
        }
        Err(_) => {} // no descriptor means a single library
    }

    log_info(&format!("Searching {} Steam library location(s)", roots.len()));
    roots
}
