//! Backend errors and their mapping onto [`Return`]
//!
//! Backends use [`BackendError`] internally with `?`. At the repository
//! boundary the error is logged and collapsed into a [`Return`] through
//! [`BackendError::status`].

use pipedb_common::Return;

/// Error raised inside a repository backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("redb error: {0}")]
    Redb(Box<redb::Error>),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! from_redb {
    ($($t:ty),*) => {$(
        impl From<$t> for BackendError {
            fn from(e: $t) -> Self {
                Self::Redb(Box::new(e.into()))
            }
        }
    )*};
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::StorageError,
    redb::TableError,
    redb::TransactionError,
    redb::CommitError
);

pub type BackendResult<T> = Result<T, BackendError>;

impl BackendError {
    /// Status reported to the caller for this error.
    ///
    /// I/O failures and corruption are backend errors; anything else is an
    /// internal error.
    pub fn status(&self) -> Return {
        match self {
            Self::Io(_) => Return::BackendError,
            Self::Redb(e) => match e.as_ref() {
                redb::Error::Io(_) | redb::Error::Corrupted(_) => Return::BackendError,
                _ => Return::InternalError,
            },
        }
    }
}
