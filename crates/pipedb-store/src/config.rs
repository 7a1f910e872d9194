//! Repository configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default redb page cache size (64 MiB)
pub const DEFAULT_CACHE_SIZE_BYTES: usize = 64 * 1024 * 1024;

/// Configuration handed to a repository at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Directory holding the database file
    pub data_dir: PathBuf,
    /// Database file name inside `data_dir`
    pub file_name: String,
    /// Page cache size in bytes
    pub cache_size_bytes: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("pipedb-data"),
            file_name: "blocks.redb".to_string(),
            cache_size_bytes: DEFAULT_CACHE_SIZE_BYTES,
        }
    }
}

impl RepositoryConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Full path of the database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

/// Storage backend selected by a settings `backend_type` code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    Redb,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend: {0}")]
pub struct UnknownBackend(pub String);

impl BackendKind {
    pub const fn code(self) -> u8 {
        match self {
            Self::Memory => 0,
            Self::Redb => 1,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, UnknownBackend> {
        match code {
            0 => Ok(Self::Memory),
            1 => Ok(Self::Redb),
            other => Err(UnknownBackend(other.to_string())),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "redb" => Ok(Self::Redb),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}
