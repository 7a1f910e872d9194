//! Concurrent FIFO
//!
//! A pipe owns every resident entry. Observers never take an entry out;
//! they receive [`Weak`] handles that stop resolving once the entry has
//! been popped, so a slow observer never keeps a popped entry alive.
//!
//! Entries are dropped after the gate is released, so an entry's `Drop`
//! may itself use the pipe.

use crate::gate::Gate;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Concurrent double-ended queue of shared entries
pub struct Pipe<T> {
    entries: Gate<VecDeque<Arc<T>>>,
}

impl<T> Pipe<T> {
    pub fn new() -> Self {
        Self {
            entries: Gate::new(VecDeque::new()),
        }
    }

    /// Create a pipe behind an exclusively-owned handle
    pub fn create() -> Box<Self> {
        Box::new(Self::new())
    }

    /// Append `value` at the tail
    pub fn push(&self, value: T) {
        let entry = Arc::new(value);
        let mut entries = self.entries.acquire_write();
        entries.push_back(entry);
        trace!(count = entries.len(), "pipe push");
    }

    /// Release the head entry.
    ///
    /// Returns false if the pipe was empty.
    pub fn pop(&self) -> bool {
        let head = self.entries.acquire_write().pop_front();
        head.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.acquire_read().is_empty()
    }

    /// Number of resident entries
    pub fn count(&self) -> usize {
        self.entries.acquire_read().len()
    }

    /// Handle on the head entry, or an empty handle if the pipe is empty
    pub fn oldest(&self) -> Weak<T> {
        self.entries
            .acquire_read()
            .front()
            .map_or_else(Weak::new, Arc::downgrade)
    }

    /// Handle on the tail entry, or an empty handle if the pipe is empty
    pub fn newest(&self) -> Weak<T> {
        self.entries
            .acquire_read()
            .back()
            .map_or_else(Weak::new, Arc::downgrade)
    }

    /// Handles on every entry ordered from newest to oldest.
    ///
    /// The gate is held only while the handles are copied out; the caller
    /// iterates without any lock. An entry popped in the meantime shows up
    /// as a handle that no longer upgrades.
    pub fn snapshot_newest_to_oldest(&self) -> Vec<Weak<T>> {
        let entries = self.entries.acquire_read();
        entries.iter().rev().map(Arc::downgrade).collect()
    }

    /// Release every entry
    pub fn clear(&self) {
        let released = std::mem::take(&mut *self.entries.acquire_write());
        trace!(released = released.len(), "pipe clear");
    }
}

impl<T> Default for Pipe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Pipe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}
