//! App manifest index
//!
//! Resolves game name -> App ID -> install directory by scanning
//! appmanifest_*.acf files across every library root. Scans are best-effort:
//! a bad manifest is skipped with a reason, never aborts the run. Every
//! (name, id) pair seen during a scan lands in the cache so later lookups
//! skip the filesystem entirely.

use std::fs;
use std::path::{Path, PathBuf};

use super::vdf;
use crate::cache::{normalize_name, NameCache};
use crate::error::HookError;
use crate::logging::{log_info, log_warning};

/// A manifest the scanner could not use, and why.
#[derive(Debug)]
pub struct ScanSkip {
    pub path: PathBuf,
    pub reason: String,
}

pub struct ManifestIndex {
    roots: Vec<PathBuf>,
    cache: NameCache,
}

impl ManifestIndex {
    pub fn new(roots: Vec<PathBuf>, cache: NameCache) -> Self {
        Self { roots, cache }
    }

    /// Resolve a game name to its App ID.
    ///
    /// A cache hit returns immediately without touching the filesystem.
    /// Otherwise every root's steamapps directory is scanned; the first
    /// manifest whose normalized name contains the query (or vice versa)
    /// wins. The cache is persisted before returning, found or not.
    pub fn resolve_app_id(&mut self, name: &str) -> Result<u32, HookError> {
        let query = normalize_name(name);
        if query.is_empty() {
            return Err(HookError::GameNotFound { name: name.to_string() });
        }

        if let Some(app_id) = self.cache.get(&query) {
            log_info(&format!("Found '{}' in cache with App ID {}", name, app_id));
            return Ok(app_id);
        }

        let mut found = None;
        let mut skipped = Vec::new();

        'roots: for root in &self.roots {
            let steamapps = root.join("steamapps");
            let Ok(entries) = fs::read_dir(&steamapps) else {
                continue;
            };

            for entry in entries.flatten() {
                let path = entry.path();
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let Some(app_id) = manifest_app_id(file_name) else {
                    continue;
                };

                match read_manifest_name(&path) {
                    Ok(manifest_name) => {
                        let normalized = normalize_name(&manifest_name);
                        // Cache every game seen, match or not, to amortize
                        // future lookups
                        self.cache.insert(normalized.clone(), app_id);

                        if names_match(&normalized, &query) {
                            found = Some((app_id, manifest_name));
                            break 'roots;
                        }
                    }
                    Err(reason) => skipped.push(ScanSkip { path, reason }),
                }
            }
        }

        for skip in &skipped {
            log_warning(&format!("Skipped {}: {}", skip.path.display(), skip.reason));
        }

        self.cache.save();

        match found {
            Some((app_id, manifest_name)) => {
                log_info(&format!("Found match: '{}' (App ID {})", manifest_name, app_id));
                Ok(app_id)
            }
            None => Err(HookError::GameNotFound { name: name.to_string() }),
        }
    }

    /// Resolve an App ID to its install directory.
    ///
    /// Checks each root for steamapps/appmanifest_<id>.acf and returns the
    /// first steamapps/common/<installdir> that exists on disk. First root
    /// in enumeration order wins; duplicate installs are not disambiguated.
    pub fn resolve_install_dir(&self, app_id: u32) -> Result<PathBuf, HookError> {
        for root in &self.roots {
            let steamapps = root.join("steamapps");
            let manifest_path = steamapps.join(format!("appmanifest_{}.acf", app_id));

            let Ok(content) = fs::read_to_string(&manifest_path) else {
                continue;
            };

            let Some(install_dir) = vdf::extract_value(&content, "installdir") else {
                log_warning(&format!(
                    "No installdir in {}",
                    manifest_path.display()
                ));
                continue;
            };

            let install_path = steamapps.join("common").join(install_dir);
            if install_path.is_dir() {
                log_info(&format!("Found game installation at {}", install_path.display()));
                return Ok(install_path);
            }
        }

        Err(HookError::InstallDirNotFound { app_id })
    }
}

/// Extract the App ID from an appmanifest_<digits>.acf filename.
fn manifest_app_id(file_name: &str) -> Option<u32> {
    let id = file_name
        .strip_prefix("appmanifest_")?
        .strip_suffix(".acf")?;
    id.parse().ok().filter(|&n| n > 0)
}

/// Read the "name" value out of a manifest file.
fn read_manifest_name(path: &Path) -> Result<String, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    vdf::extract_value(&content, "name")
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| "manifest has no name".to_string())
}

/// Bidirectional substring containment on normalized names.
fn names_match(manifest_name: &str, query: &str) -> bool {
    manifest_name.contains(query) || query.contains(manifest_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "protonhook_manifest_test_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("steamapps/common")).unwrap();
        dir
    }

    fn write_manifest(root: &Path, app_id: u32, name: &str, install_dir: &str) {
        let content = format!(
            "\"AppState\"\n{{\n    \"appid\"  \"{}\"\n    \"name\"  \"{}\"\n    \"installdir\"  \"{}\"\n}}\n",
            app_id, name, install_dir
        );
        fs::write(
            root.join(format!("steamapps/appmanifest_{}.acf", app_id)),
            content,
        )
        .unwrap();
    }

    fn temp_cache(tag: &str) -> NameCache {
        let path = std::env::temp_dir().join(format!(
            "protonhook_manifest_cache_{}_{}.json",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        NameCache::load_from(path)
    }

    #[test]
    fn test_manifest_app_id_pattern() {
        assert_eq!(manifest_app_id("appmanifest_440.acf"), Some(440));
        assert_eq!(manifest_app_id("appmanifest_0.acf"), None);
        assert_eq!(manifest_app_id("appmanifest_abc.acf"), None);
        assert_eq!(manifest_app_id("libraryfolders.vdf"), None);
        assert_eq!(manifest_app_id("appmanifest_440.acf.bak"), None);
    }

    #[test]
    fn test_names_match_is_bidirectional() {
        assert!(names_match("team fortress 2", "team fortress"));
        assert!(names_match("team fortress", "team fortress 2"));
        assert!(!names_match("team fortress 2", "half-life"));
    }

    #[test]
    fn test_resolve_app_id_by_partial_name() {
        let root = fixture_root("partial");
        write_manifest(&root, 440, "Team Fortress 2", "Team Fortress 2");

        let mut index = ManifestIndex::new(vec![root.clone()], temp_cache("partial"));
        assert_eq!(index.resolve_app_id("team fortress").unwrap(), 440);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_resolve_app_id_not_found() {
        let root = fixture_root("notfound");
        write_manifest(&root, 440, "Team Fortress 2", "Team Fortress 2");

        let mut index = ManifestIndex::new(vec![root.clone()], temp_cache("notfound"));
        let err = index.resolve_app_id("stardew valley").unwrap_err();
        assert_eq!(
            err,
            HookError::GameNotFound {
                name: "stardew valley".to_string()
            }
        );
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_cache_short_circuits_scanning() {
        let root = fixture_root("cachehit");
        write_manifest(&root, 440, "Team Fortress 2", "Team Fortress 2");

        let cache = temp_cache("cachehit");
        let mut index = ManifestIndex::new(vec![root.clone()], cache);
        let first = index.resolve_app_id("team fortress 2").unwrap();

        // Second resolution over roots that no longer exist must still
        // succeed from the persisted cache, proving no scan happened.
        let reloaded = NameCache::load_from(
            std::env::temp_dir().join(format!(
                "protonhook_manifest_cache_cachehit_{}.json",
                std::process::id()
            )),
        );
        let mut cached_index =
            ManifestIndex::new(vec![PathBuf::from("/nonexistent/root")], reloaded);
        let second = cached_index.resolve_app_id("team fortress 2").unwrap();

        assert_eq!(first, second);
        assert_eq!(first, 440);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_non_matching_games_still_cached() {
        let root = fixture_root("amortize");
        write_manifest(&root, 440, "Team Fortress 2", "Team Fortress 2");
        write_manifest(&root, 220, "Half-Life 2", "Half-Life 2");

        let mut index = ManifestIndex::new(vec![root.clone()], temp_cache("amortize"));
        let _ = index.resolve_app_id("definitely not installed");

        let reloaded = NameCache::load_from(
            std::env::temp_dir().join(format!(
                "protonhook_manifest_cache_amortize_{}.json",
                std::process::id()
            )),
        );
        assert_eq!(reloaded.get("team fortress 2"), Some(440));
        assert_eq!(reloaded.get("half-life 2"), Some(220));
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_bad_manifest_is_skipped_not_fatal() {
        let root = fixture_root("badfile");
        fs::write(root.join("steamapps/appmanifest_999.acf"), "\"AppState\" {").unwrap();
        write_manifest(&root, 440, "Team Fortress 2", "Team Fortress 2");

        let mut index = ManifestIndex::new(vec![root.clone()], temp_cache("badfile"));
        assert_eq!(index.resolve_app_id("team fortress").unwrap(), 440);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_resolve_install_dir() {
        let root = fixture_root("installdir");
        write_manifest(&root, 440, "Team Fortress 2", "Team Fortress 2");
        fs::create_dir_all(root.join("steamapps/common/Team Fortress 2")).unwrap();

        let index = ManifestIndex::new(vec![root.clone()], temp_cache("installdir"));
        assert_eq!(
            index.resolve_install_dir(440).unwrap(),
            root.join("steamapps/common/Team Fortress 2")
        );
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_resolve_install_dir_requires_existing_directory() {
        let root = fixture_root("missing_dir");
        // Manifest points at a directory that was deleted
        write_manifest(&root, 440, "Team Fortress 2", "Team Fortress 2");

        let index = ManifestIndex::new(vec![root.clone()], temp_cache("missing_dir"));
        assert_eq!(
            index.resolve_install_dir(440).unwrap_err(),
            HookError::InstallDirNotFound { app_id: 440 }
        );
        let _ = fs::remove_dir_all(root);
    }
}
