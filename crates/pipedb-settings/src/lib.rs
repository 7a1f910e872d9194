//! PipeDB Settings - File-backed configuration
//!
//! [`Settings`] holds the values PipeDB reads from a TOML file and can write
//! them back. [`SettingsReloader`] watches that file from a background task
//! and reloads the settings whenever the file's checksum changes.

pub mod error;
pub mod reloader;
pub mod settings;

pub use error::{Result, SettingsError};
pub use reloader::{DEFAULT_POLL_INTERVAL, SettingsReloader};
pub use settings::{Settings, SettingsValues};
