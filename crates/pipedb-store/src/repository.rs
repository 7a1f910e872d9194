//! The block repository contract
//!
//! Every operation reports a [`Return`]; nothing is raised across the
//! contract. Keys and blocks are borrowed for exactly one call.
//!
//! A closed repository refuses data operations with
//! [`Return::NotSupported`] and answers membership queries with `false`.

use crate::config::{BackendKind, RepositoryConfig};
use crate::memory::MemoryRepository;
use crate::redb_repository::RedbRepository;
use pipedb_common::{InputBlock, Key, OutputBlock, Return};

/// Key/value store of byte blocks
pub trait BlockRepository: Send + Sync {
    /// Open the backend.
    ///
    /// Returns [`Return::NotSupported`] if the repository is already open.
    fn open(&self) -> Return;

    fn opened(&self) -> bool;

    /// Release the backend. Closing a closed repository does nothing.
    fn close(&self) -> Return;

    fn closed(&self) -> bool {
        !self.opened()
    }

    /// Store `value` under `key`.
    ///
    /// Returns [`Return::KeyHeretoforeIncluded`] if an existing value was
    /// replaced.
    fn put(&self, key: Key<'_>, value: InputBlock<'_>) -> Return;

    /// Copy the value stored under `key` into `out_value`.
    ///
    /// `out_value` is left untouched unless [`Return::Ok`] is returned.
    fn get(&self, key: Key<'_>, out_value: &mut OutputBlock) -> Return;

    /// Remove `key` if present
    fn drop_key(&self, key: Key<'_>) -> Return;

    fn included(&self, key: Key<'_>) -> bool;

    /// True if the repository is open and does not hold `key`
    fn excluded(&self, key: Key<'_>) -> bool {
        self.opened() && !self.included(key)
    }

    /// Destroy every stored block.
    ///
    /// Returns [`Return::NotSupported`] while the repository is open.
    fn erase(&self) -> Return;
}

/// Build an unopened repository of the given kind
pub fn create_repository(kind: BackendKind, config: RepositoryConfig) -> Box<dyn BlockRepository> {
    match kind {
        BackendKind::Memory => Box::new(MemoryRepository::new()),
        BackendKind::Redb => Box::new(RedbRepository::new(config)),
    }
}
