//! Wine binary discovery across Proton installations
//!
//! Two strategies, first success wins. Strategy 1 pins to the Proton build
//! a reference app actually ran under, by reading its compatdata version
//! marker and mapping that version string onto an installed Proton
//! directory. Strategy 2 falls back to the newest-looking Proton present in
//! any library. Both end with an executable-wine check.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::HookError;
use crate::logging::{log_info, log_warning};

/// Relative wine binary locations inside a Proton directory, in the order
/// they are tried. The ordering is historical, not semantic.
pub const WINE_BINARY_SUBPATHS: &[&str] = &[
    "dist/bin/wine64",
    "files/bin/wine64",
    "dist/bin/wine",
    "files/bin/wine",
    "bin/wine64",
    "bin/wine",
];

/// App whose compatdata version marker identifies the Proton build in use.
/// Configurable per lookup; this default matches the app the tool ships for.
pub const DEFAULT_REFERENCE_APP_ID: u32 = 544730;

/// Experimental sorts above any numbered release.
const EXPERIMENTAL_SORT_KEY: u64 = 9999;

pub struct ProtonLocator {
    roots: Vec<PathBuf>,
    reference_app_id: u32,
}

impl ProtonLocator {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            reference_app_id: DEFAULT_REFERENCE_APP_ID,
        }
    }

    /// Use a different reference app for the used-runtime strategy.
    #[must_use]
    pub fn with_reference_app(mut self, app_id: u32) -> Self {
        self.reference_app_id = app_id;
        self
    }

    /// Find a usable wine binary: the one belonging to the Proton build the
    /// reference app runs under if resolvable, otherwise the newest Proton
    /// installed anywhere.
    pub fn find_wine_binary(&self) -> Result<PathBuf, HookError> {
        if let Some(wine) = self.find_used_wine() {
            return Ok(wine);
        }
        self.find_newest_wine().ok_or(HookError::WineNotFound)
    }

    // ------------------------------------------------------------------
    // Strategy 1: the Proton build the reference app runs under
    // ------------------------------------------------------------------

    fn find_used_wine(&self) -> Option<PathBuf> {
        let version = self.read_reference_version()?;
        log_info(&format!("Reference app reports Proton version '{}'", version));

        let dir_name = self.map_version_to_directory(&version)?;
        log_info(&format!("Mapped version '{}' to directory '{}'", version, dir_name));

        for root in &self.roots {
            let proton_path = root.join("steamapps/common").join(&dir_name);
            if let Some(wine) = wine_binary_in(&proton_path) {
                return Some(wine);
            }
        }

        log_warning(&format!(
            "Proton directory '{}' has no usable wine binary",
            dir_name
        ));
        None
    }

    /// Read the single-line version marker from the reference app's
    /// compatdata, checking every library root.
    fn read_reference_version(&self) -> Option<String> {
        for root in &self.roots {
            let marker = root
                .join("steamapps/compatdata")
                .join(self.reference_app_id.to_string())
                .join("version");
            if let Ok(content) = fs::read_to_string(&marker) {
                let version = content.trim().to_string();
                if !version.is_empty() {
                    return Some(version);
                }
            }
        }
        None
    }

    /// Map a version string to an installed Proton directory name.
    ///
    /// Tiers, in order: the candidate's own version file (exact, then
    /// major.minor-compatible), direct substring of the directory name,
    /// mutual experimental marker, bare major.minor substring.
    fn map_version_to_directory(&self, version: &str) -> Option<String> {
        let candidates = self.proton_dir_names();
        if candidates.is_empty() {
            return None;
        }

        for name in &candidates {
            if let Some(installed) = self.read_proton_version_file(name) {
                if installed.eq_ignore_ascii_case(version)
                    || versions_compatible(&installed, version)
                {
                    return Some(name.clone());
                }
            }
        }

        let version_lower = version.to_lowercase();
        for name in &candidates {
            if name.to_lowercase().contains(&version_lower) {
                return Some(name.clone());
            }
        }

        if is_experimental(version) {
            for name in &candidates {
                if is_experimental(name) {
                    return Some(name.clone());
                }
            }
        }

        if let Some((major, minor)) = major_minor(version) {
            let needle = format!("{}.{}", major, minor);
            for name in &candidates {
                if name.contains(&needle) {
                    return Some(name.clone());
                }
            }
        }

        log_warning(&format!("Could not map version '{}' to any Proton directory", version));
        None
    }

    /// Unique Proton directory names across all roots, discovery order.
    fn proton_dir_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for root in &self.roots {
            for (name, _) in proton_dirs_under(root) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Read the version file at a named Proton directory's root, checking
    /// every library.
    fn read_proton_version_file(&self, dir_name: &str) -> Option<String> {
        for root in &self.roots {
            let version_file = root.join("steamapps/common").join(dir_name).join("version");
            if let Ok(content) = fs::read_to_string(&version_file) {
                let version = content.trim().to_string();
                if !version.is_empty() {
                    return Some(version);
                }
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Strategy 2: newest Proton installed anywhere
    // ------------------------------------------------------------------

    fn find_newest_wine(&self) -> Option<PathBuf> {
        let mut dirs: Vec<(String, PathBuf)> = Vec::new();
        for root in &self.roots {
            dirs.extend(proton_dirs_under(root));
        }

        if dirs.is_empty() {
            log_warning("No Proton installations found in any Steam library");
            return None;
        }

        // Stable sort: ties keep discovery order
        dirs.sort_by(|a, b| version_sort_key(&b.0).cmp(&version_sort_key(&a.0)));

        for (name, path) in &dirs {
            if let Some(wine) = wine_binary_in(path) {
                log_info(&format!("Using wine binary from '{}': {}", name, wine.display()));
                return Some(wine);
            }
        }

        log_warning("No wine binary found in any Proton installation");
        None
    }
}

/// Directories under a root's steamapps/common whose name contains
/// "proton" (case-insensitive).
fn proton_dirs_under(root: &Path) -> Vec<(String, PathBuf)> {
    let mut found = Vec::new();
    let common = root.join("steamapps/common");

    if let Ok(entries) = fs::read_dir(common) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.to_lowercase().contains("proton") {
                found.push((name, path));
            }
        }
    }

    found
}

/// First wine binary that exists and is executable under a Proton
/// directory, following the known subpath order.
fn wine_binary_in(proton_path: &Path) -> Option<PathBuf> {
    WINE_BINARY_SUBPATHS
        .iter()
        .map(|sub| proton_path.join(sub))
        .find(|p| p.is_file() && is_executable(p))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Two version strings are compatible when their leading major.minor pairs
/// are equal, or both carry an experimental marker. Symmetric.
fn versions_compatible(a: &str, b: &str) -> bool {
    match (major_minor(a), major_minor(b)) {
        (Some(pair_a), Some(pair_b)) => pair_a == pair_b,
        _ => is_experimental(a) && is_experimental(b),
    }
}

fn is_experimental(s: &str) -> bool {
    s.to_lowercase().contains("experimental")
}

/// Extract the first dot-separated `major.minor` number pair, e.g.
/// "9.0-4" -> (9, 0). Returns None if no such pair exists.
fn major_minor(s: &str) -> Option<(u32, u32)> {
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b'.' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
                let major: u32 = s[start..i].parse().ok()?;
                let minor_start = i + 1;
                let mut j = minor_start;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                let minor: u32 = s[minor_start..j].parse().ok()?;
                return Some((major, minor));
            }
        } else {
            i += 1;
        }
    }

    None
}

/// Sort key for "newest first" ordering of Proton directory names.
/// Experimental beats everything; otherwise the first run of digits in the
/// name; no digits sorts as zero.
fn version_sort_key(name: &str) -> u64 {
    if is_experimental(name) {
        return EXPERIMENTAL_SORT_KEY;
    }

    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();

    digits.parse().unwrap_or(0)
}
