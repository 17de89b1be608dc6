//! # silvertone-settings
//!
//! Configuration with layered sources for the speech-to-text and emotion
//! services.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`SilvertoneSettings::default()`]
//! 2. **Settings file**: `~/.silvertone/settings.json` or an explicit path
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `SILVERTONE_*` overrides (highest priority)
//!
//! The binary applies command-line flags on top of the loaded value.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    deep_merge, load_required_settings, load_settings, load_settings_from_path, settings_path,
    validate,
};
pub use types::*;
