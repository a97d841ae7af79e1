//! Crate-wide error type
//!
//! Lookups that come up empty are typed errors the caller can inspect,
//! never panics or process exits. Per-file parse problems are swallowed by
//! the scanners and reported as skip reasons; only whole-resolution
//! failures surface here.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum HookError {
    /// No Steam installation found at any known location
    SteamNotFound,
    /// Game name did not match any appmanifest in any library
    GameNotFound { name: String },
    /// No appmanifest for this id produced an existing install directory
    InstallDirNotFound { app_id: u32 },
    /// compatdata/<id>/pfx missing - the game has never run under Proton
    PrefixNotFound { app_id: u32, searched: Vec<String> },
    /// No usable wine binary in any Proton installation
    WineNotFound,
    /// Only the winhttp override is supported
    UnsupportedOverride { name: String },
    /// Spawn failure or other process-level error
    Process { context: String, reason: String },
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::SteamNotFound => {
                write!(f, "Steam installation not found at any known location")
            }
            HookError::GameNotFound { name } => {
                write!(f, "Game '{}' not found in any Steam library", name)
            }
            HookError::InstallDirNotFound { app_id } => {
                write!(f, "Could not find installation directory for App ID {}", app_id)
            }
            HookError::PrefixNotFound { app_id, searched } => {
                write!(f, "No Wine prefix for App ID {} (searched: {})", app_id, searched.join(", "))
            }
            HookError::WineNotFound => {
                write!(f, "No wine binary found in any Proton installation")
            }
            HookError::UnsupportedOverride { name } => {
                write!(f, "Unsupported DLL override '{}': only winhttp is supported", name)
            }
            HookError::Process { context, reason } => {
                write!(f, "{}: {}", context, reason)
            }
        }
    }
}

impl std::error::Error for HookError {}
