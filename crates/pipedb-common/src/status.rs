//! Status returned by every exposed repository operation
//!
//! ```
//! use pipedb_common::Return;
//!
//! fn exposed() -> Return {
//!     // ...
//!     Return::Ok
//! }
//!
//! assert!(exposed().success());
//! ```
//!
//! Callers should branch on the predicates rather than matching the
//! variants, so that new states can be added without breaking them.

use std::fmt;

/// Outcome of a repository operation
#[must_use]
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Return {
    /// The operation succeeded
    Ok,
    /// A put succeeded and the key already existed
    KeyHeretoforeIncluded,
    /// The key is not in the repository
    KeyNotPresent,
    /// The storage backend reported an I/O or corruption failure
    BackendError,
    /// An unexpected condition was reached
    InternalError,
    /// The operation is not allowed in the current state
    NotSupported,
}

impl Return {
    /// Returns true if this indicates successful operation.
    pub const fn success(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns true if this indicates that the key is present.
    pub const fn key_is_present(self) -> bool {
        matches!(self, Self::Ok | Self::KeyHeretoforeIncluded)
    }

    /// Returns true if this indicates that the key was not found.
    pub const fn key_not_present(self) -> bool {
        matches!(self, Self::KeyNotPresent)
    }

    /// Returns true if the storage backend reported an error.
    pub const fn backend_error(self) -> bool {
        matches!(self, Self::BackendError)
    }

    /// Returns true if PipeDB itself detected an error.
    pub const fn internal_error(self) -> bool {
        matches!(self, Self::InternalError)
    }

    /// Returns true if the operation is not supported in the current state.
    pub const fn not_supported(self) -> bool {
        matches!(self, Self::NotSupported)
    }

    /// Upper-case name of the state
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::KeyHeretoforeIncluded => "KEY_HERETOFORE_INCLUDED",
            Self::KeyNotPresent => "KEY_NOT_PRESENT",
            Self::BackendError => "BACKEND_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::NotSupported => "NOT_SUPPORTED",
        }
    }
}

impl fmt::Display for Return {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
