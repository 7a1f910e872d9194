//! Error types for PipeDB
//!
//! This module defines the common error types used by the value types and
//! utilities in this crate. Repository operations do not use these errors
//! across their contract boundary; they report a [`crate::Return`] instead.

use thiserror::Error;

/// Common result type for PipeDB utilities
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for PipeDB
#[derive(Debug, Error)]
pub enum Error {
    #[error("key too short for partitioning: need {required} bytes, have {actual}")]
    KeyTooShort { required: usize, actual: usize },

    #[error("partition count must be greater than zero")]
    NoPartitions,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error was raised by the filesystem
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
