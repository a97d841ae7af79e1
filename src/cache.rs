//! Persistent game-name -> App ID cache
//!
//! A flat JSON map at a fixed path under the home directory, consulted
//! before any manifest scan and rewritten wholesale after one. Keys are
//! normalized (lowercase, trimmed) names; last write wins. The cache is an
//! explicit collaborator handed to the manifest index rather than ambient
//! global state.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::logging::{log_info, log_warning};

const CACHE_FILE_NAME: &str = ".protonhook_appid_cache.json";

/// Normalize a game name for cache keys and matching.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct NameCache {
    path: PathBuf,
    entries: HashMap<String, u32>,
}

impl NameCache {
    /// Default cache location: ~/.protonhook_appid_cache.json
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::home_dir().unwrap_or_default().join(CACHE_FILE_NAME)
    }

    /// Load the cache from the default location.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load the cache from a specific file. A missing or unreadable file
    /// yields an empty cache; a corrupt file is reported and discarded.
    #[must_use]
    pub fn load_from(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    log_warning(&format!("Failed to parse cache {}: {}", path.display(), e));
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    pub fn get(&self, normalized_name: &str) -> Option<u32> {
        self.entries.get(normalized_name).copied()
    }

    pub fn insert(&mut self, normalized_name: String, app_id: u32) {
        self.entries.insert(normalized_name, app_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the full map, replacing whatever was on disk. Write failures
    /// are reported but not fatal - the cache only exists to skip rescans.
    pub fn save(&self) {
        match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    log_warning(&format!("Failed to save cache {}: {}", self.path.display(), e));
                } else {
                    log_info(&format!("Cache updated with {} games", self.entries.len()));
                }
            }
            Err(e) => log_warning(&format!("Failed to serialize cache: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("protonhook_cache_test_{}_{}.json", tag, std::process::id()))
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Team Fortress 2 "), "team fortress 2");
        assert_eq!(normalize_name("HOLLOW KNIGHT"), "hollow knight");
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_cache_path("roundtrip");
        let mut cache = NameCache::load_from(path.clone());
        assert!(cache.is_empty());

        cache.insert("team fortress 2".to_string(), 440);
        cache.insert("hollow knight".to_string(), 367520);
        cache.save();

        let reloaded = NameCache::load_from(path.clone());
        assert_eq!(reloaded.get("team fortress 2"), Some(440));
        assert_eq!(reloaded.get("hollow knight"), Some(367520));
        assert_eq!(reloaded.len(), 2);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_last_write_wins() {
        let path = temp_cache_path("lastwrite");
        let mut cache = NameCache::load_from(path.clone());
        cache.insert("proton test app".to_string(), 1);
        cache.insert("proton test app".to_string(), 2);
        assert_eq!(cache.get("proton test app"), Some(2));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_corrupt_file_yields_empty_cache() {
        let path = temp_cache_path("corrupt");
        fs::write(&path, "not json at all {{{").unwrap();
        let cache = NameCache::load_from(path.clone());
        assert!(cache.is_empty());
        let _ = fs::remove_file(path);
    }
}
