//! Entry points for external callers
//!
//! The loader front-end (archive download, prompts, plugin install) only
//! ever calls `resolve_game_install_dir` and `apply_runtime_override`.
//! Resolution functions return typed results; the integer-status wrapper
//! renders diagnostics through the logging boundary.

use std::path::PathBuf;

use crate::cache::NameCache;
use crate::error::HookError;
use crate::logging::{log_error, log_info};
use crate::proton::{self, OverrideResult, ProtonLocator};
use crate::steam::{find_library_roots, find_steam_path, ManifestIndex};

/// Resolve a game's install directory from its (possibly partial) name.
pub fn resolve_game_install_dir(game_name: &str) -> Result<PathBuf, HookError> {
    let steam_path = find_steam_path().ok_or(HookError::SteamNotFound)?;
    let roots = find_library_roots(&steam_path);

    let mut index = ManifestIndex::new(roots, NameCache::load());
    let app_id = index.resolve_app_id(game_name)?;
    index.resolve_install_dir(app_id)
}

/// Set a DLL override inside a game's Proton prefix.
///
/// Returns 0 on success, 1 on any failure. Only "winhttp" is supported.
pub fn apply_runtime_override(app_id: u32, override_name: &str) -> i32 {
    render_override_outcome(try_apply_override(app_id, override_name, None))
}

/// Like [`apply_runtime_override`] but with a typed result and an optional
/// reference app for the used-runtime strategy.
pub fn try_apply_override(
    app_id: u32,
    override_name: &str,
    reference_app_id: Option<u32>,
) -> Result<OverrideResult, HookError> {
    if !override_name.eq_ignore_ascii_case("winhttp") {
        return Err(HookError::UnsupportedOverride {
            name: override_name.to_string(),
        });
    }

    let steam_path = find_steam_path().ok_or(HookError::SteamNotFound)?;
    let roots = find_library_roots(&steam_path);

    let prefix = find_prefix(&roots, app_id)?;
    log_info(&format!("Found Wine prefix for app {}: {}", app_id, prefix.display()));

    let mut locator = ProtonLocator::new(roots);
    if let Some(ref_id) = reference_app_id {
        locator = locator.with_reference_app(ref_id);
    }
    let wine = locator.find_wine_binary()?;

    proton::apply_winhttp_override(&wine, &prefix)
}

/// Map an override outcome to the 0/1 status contract, logging diagnostics.
pub fn render_override_outcome(outcome: Result<OverrideResult, HookError>) -> i32 {
    match outcome {
        Ok(result) if result.success() => {
            log_info("winhttp override set to native,builtin");
            0
        }
        Ok(result) => {
            if result.timed_out {
                log_error("wine regedit timed out");
            } else {
                log_error(&format!(
                    "wine regedit failed (exit code: {:?})",
                    result.exit_code
                ));
            }
            if !result.stderr.is_empty() {
                log_error(&format!("stderr: {}", result.stderr.trim_end()));
            }
            if !result.stdout.is_empty() {
                log_error(&format!("stdout: {}", result.stdout.trim_end()));
            }
            1
        }
        Err(err) => {
            log_error(&err.to_string());
            1
        }
    }
}

/// Locate compatdata/<id>/pfx across all library roots.
fn find_prefix(roots: &[PathBuf], app_id: u32) -> Result<PathBuf, HookError> {
    let mut searched = Vec::new();

    for root in roots {
        let compatdata = root
            .join("steamapps/compatdata")
            .join(app_id.to_string());
        if compatdata.is_dir() {
            let prefix = compatdata.join("pfx");
            if prefix.is_dir() {
                return Ok(prefix);
            }
        }
        searched.push(compatdata.display().to_string());
    }

    Err(HookError::PrefixNotFound { app_id, searched })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_unsupported_override_is_rejected() {
        let err = try_apply_override(440, "d3d11", None).unwrap_err();
        assert_eq!(
            err,
            HookError::UnsupportedOverride {
                name: "d3d11".to_string()
            }
        );
    }

    #[test]
    fn test_find_prefix_reports_searched_paths() {
        let root = std::env::temp_dir().join(format!(
            "protonhook_api_test_noprefix_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("steamapps")).unwrap();

        let err = find_prefix(&[root.clone()], 440).unwrap_err();
        match err {
            HookError::PrefixNotFound { app_id, searched } => {
                assert_eq!(app_id, 440);
                assert_eq!(searched.len(), 1);
                assert!(searched[0].contains("compatdata"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_find_prefix_requires_pfx_directory() {
        let root = std::env::temp_dir().join(format!(
            "protonhook_api_test_pfx_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("steamapps/compatdata/440/pfx")).unwrap();

        let prefix = find_prefix(&[root.clone()], 440).unwrap();
        assert_eq!(prefix, root.join("steamapps/compatdata/440/pfx"));
        let _ = fs::remove_dir_all(root);
    }
}
