//! Proton discovery and prefix registry overrides

pub mod locator;
pub mod registry;

pub use locator::{ProtonLocator, DEFAULT_REFERENCE_APP_ID, WINE_BINARY_SUBPATHS};
pub use registry::{apply_winhttp_override, OverrideResult, REGEDIT_TIMEOUT};
