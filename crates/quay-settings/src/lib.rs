//! # quay-settings
//!
//! Layered configuration for the quay gateway:
//!
//! 1. Compiled defaults ([`Settings::default`])
//! 2. `~/.quay/settings.json`, deep-merged over the defaults
//! 3. `QUAY_*` environment variable overrides (highest priority)
//!
//! The loaded [`Settings`] value doubles as the opaque config snapshot
//! handed to the restart coordinator alongside a reload plan.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::{RestartSettings, ServerSettings, Settings, TerminalSettings};
