//! In-memory block repository
//!
//! Simple hash map based storage, useful for testing and single-process use.
//! Blocks survive a close/open cycle and are discarded by `erase`.

use crate::repository::BlockRepository;
use pipedb_common::{InputBlock, Key, OutputBlock, Return};
use pipedb_sync::Gate;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    blocks: HashMap<Vec<u8>, Vec<u8>>,
}

/// Block repository held in process memory
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Gate<MemoryState>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks
    pub fn len(&self) -> usize {
        self.state.acquire_read().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlockRepository for MemoryRepository {
    fn open(&self) -> Return {
        let mut state = self.state.acquire_write();
        if state.open {
            return Return::NotSupported;
        }
        state.open = true;
        debug!(blocks = state.blocks.len(), "memory repository opened");
        Return::Ok
    }

    fn opened(&self) -> bool {
        self.state.acquire_read().open
    }

    fn close(&self) -> Return {
        self.state.acquire_write().open = false;
        Return::Ok
    }

    fn put(&self, key: Key<'_>, value: InputBlock<'_>) -> Return {
        let mut state = self.state.acquire_write();
        if !state.open {
            return Return::NotSupported;
        }
        match state.blocks.insert(key.to_vec(), value.to_vec()) {
            Some(_) => Return::KeyHeretoforeIncluded,
            None => Return::Ok,
        }
    }

    fn get(&self, key: Key<'_>, out_value: &mut OutputBlock) -> Return {
        let state = self.state.acquire_read();
        if !state.open {
            return Return::NotSupported;
        }
        match state.blocks.get(key.data()) {
            Some(value) => {
                out_value.set_data(value);
                Return::Ok
            }
            None => Return::KeyNotPresent,
        }
    }

    fn drop_key(&self, key: Key<'_>) -> Return {
        let mut state = self.state.acquire_write();
        if !state.open {
            return Return::NotSupported;
        }
        state.blocks.remove(key.data());
        Return::Ok
    }

    fn included(&self, key: Key<'_>) -> bool {
        let state = self.state.acquire_read();
        state.open && state.blocks.contains_key(key.data())
    }

    fn excluded(&self, key: Key<'_>) -> bool {
        let state = self.state.acquire_read();
        state.open && !state.blocks.contains_key(key.data())
    }

    fn erase(&self) -> Return {
        let mut state = self.state.acquire_write();
        if state.open {
            return Return::NotSupported;
        }
        let erased = std::mem::take(&mut state.blocks);
        state.release();
        debug!(blocks = erased.len(), "memory repository erased");
        Return::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survives_close() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.open(), Return::Ok);
        assert_eq!(repo.put(Key::from("a"), InputBlock::from("1")), Return::Ok);
        assert_eq!(repo.close(), Return::Ok);
        assert_eq!(repo.len(), 1);

        assert_eq!(repo.open(), Return::Ok);
        assert!(repo.included(Key::from("a")));
        assert_eq!(repo.close(), Return::Ok);

        assert_eq!(repo.erase(), Return::Ok);
        assert!(repo.is_empty());
    }

    #[test]
    fn test_binary_keys() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.open(), Return::Ok);
        let key = [0u8, 0xff, 0x10];
        let value = vec![0u8; 4096];
        assert_eq!(repo.put(Key::from(&key), InputBlock::from(&value)), Return::Ok);

        let mut out = OutputBlock::new();
        assert_eq!(repo.get(Key::from(&key), &mut out), Return::Ok);
        assert_eq!(out.data(), value.as_slice());
        assert!(repo.excluded(Key::from(&key[..2])));
    }
}
