//! Settings persisted in a TOML file
//!
//! ```toml
//! backend_type = 1
//! temporary_directory = "/var/tmp/pipedb"
//! persistence_directories = ["/data/a", "/data/b"]
//! ```
//!
//! Persistence directories are kept sorted, both when loaded and when
//! saved.

use crate::error::Result;
use pipedb_common::file_checksum;
use pipedb_sync::Gate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Values stored in a settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsValues {
    /// Backend selector code
    #[serde(default)]
    pub backend_type: u8,
    /// Scratch space for the backend
    pub temporary_directory: PathBuf,
    /// Directories holding persistent data
    pub persistence_directories: Vec<PathBuf>,
}

impl SettingsValues {
    fn normalize(&mut self) {
        self.persistence_directories.sort();
    }
}

/// Thread-safe settings bound to a file path
#[derive(Debug)]
pub struct Settings {
    path: PathBuf,
    values: Gate<SettingsValues>,
}

impl Settings {
    /// Settings bound to `path` with default values; nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: Gate::new(SettingsValues::default()),
        }
    }

    pub fn create(path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory values with the file contents.
    ///
    /// On failure the current values are left untouched.
    pub fn load(&self) -> Result<()> {
        let content = fs::read_to_string(&self.path)?;
        let mut values: SettingsValues = toml::from_str(&content)?;
        values.normalize();
        *self.values.acquire_write() = values;
        debug!(path = %self.path.display(), "settings loaded");
        Ok(())
    }

    /// Write the in-memory values to the file
    pub fn save(&self) -> Result<()> {
        let content = {
            let mut values = self.values.acquire_write();
            values.normalize();
            toml::to_string(&*values)?
        };
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    /// CRC32C of the file, or `None` if it cannot be read
    pub fn checksum(&self) -> Option<u32> {
        file_checksum(&self.path).ok()
    }

    /// Snapshot of the current values
    pub fn values(&self) -> SettingsValues {
        self.values.acquire_read().clone()
    }

    pub fn backend_type(&self) -> u8 {
        self.values.acquire_read().backend_type
    }

    pub fn set_backend_type(&self, backend_type: u8) {
        self.values.acquire_write().backend_type = backend_type;
    }

    pub fn temporary_directory(&self) -> PathBuf {
        self.values.acquire_read().temporary_directory.clone()
    }

    pub fn set_temporary_directory(&self, dir: impl Into<PathBuf>) {
        self.values.acquire_write().temporary_directory = dir.into();
    }

    pub fn persistence_directories(&self) -> Vec<PathBuf> {
        self.values.acquire_read().persistence_directories.clone()
    }

    pub fn add_persistence_directory(&self, dir: impl Into<PathBuf>) {
        let mut values = self.values.acquire_write();
        values.persistence_directories.push(dir.into());
        values.normalize();
    }

    pub fn set_persistence_directories(&self, dirs: Vec<PathBuf>) {
        let mut values = self.values.acquire_write();
        values.persistence_directories = dirs;
        values.normalize();
    }
}
