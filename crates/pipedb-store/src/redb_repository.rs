//! Block repository backed by redb.
//!
//! All blocks live in a single `blocks` table of a single database file.
//! Every write is its own transaction, committed before the call returns.

use crate::config::RepositoryConfig;
use crate::error::{BackendError, BackendResult};
use crate::repository::BlockRepository;
use pipedb_common::{InputBlock, Key, OutputBlock, Return};
use pipedb_sync::Gate;
use redb::{Database, TableDefinition};
use std::fs;
use std::io;
use tracing::{debug, error, info};

const BLOCKS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("blocks");

/// Persistent block repository
pub struct RedbRepository {
    config: RepositoryConfig,
    db: Gate<Option<Database>>,
}

impl RedbRepository {
    pub fn new(config: RepositoryConfig) -> Self {
        Self {
            config,
            db: Gate::new(None),
        }
    }

    fn open_database(&self) -> BackendResult<Database> {
        fs::create_dir_all(&self.config.data_dir)?;
        let db = Database::builder()
            .set_cache_size(self.config.cache_size_bytes)
            .create(self.config.database_path())?;

        // Create the table eagerly so later read txns don't fail
        let write_txn = db.begin_write()?;
        {
            let _t = write_txn.open_table(BLOCKS)?;
        }
        write_txn.commit()?;
        Ok(db)
    }

    fn status(&self, op: &str, e: &BackendError) -> Return {
        error!(
            "Failed to {} in {}: {}",
            op,
            self.config.database_path().display(),
            e
        );
        e.status()
    }
}

fn insert(db: &Database, key: &[u8], value: &[u8]) -> BackendResult<bool> {
    let write_txn = db.begin_write()?;
    let existed = {
        let mut table = write_txn.open_table(BLOCKS)?;
        let old = table.insert(key, value)?;
        old.is_some()
    };
    write_txn.commit()?;
    Ok(existed)
}

fn fetch(db: &Database, key: &[u8], out: &mut OutputBlock) -> BackendResult<bool> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(BLOCKS)?;
    let Some(value) = table.get(key)? else {
        return Ok(false);
    };
    out.set_data(value.value());
    Ok(true)
}

fn remove(db: &Database, key: &[u8]) -> BackendResult<()> {
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(BLOCKS)?;
        table.remove(key)?;
    }
    write_txn.commit()?;
    Ok(())
}

fn contains(db: &Database, key: &[u8]) -> BackendResult<bool> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(BLOCKS)?;
    let found = table.get(key)?.is_some();
    Ok(found)
}

impl BlockRepository for RedbRepository {
    fn open(&self) -> Return {
        let mut db = self.db.acquire_write();
        if db.is_some() {
            return Return::NotSupported;
        }
        match self.open_database() {
            Ok(handle) => {
                *db = Some(handle);
                info!(path = %self.config.database_path().display(), "repository opened");
                Return::Ok
            }
            Err(e) => self.status("open repository", &e),
        }
    }

    fn opened(&self) -> bool {
        self.db.acquire_read().is_some()
    }

    fn close(&self) -> Return {
        // the database is dropped after the gate is released
        let handle = self.db.acquire_write().take();
        if handle.is_some() {
            info!(path = %self.config.database_path().display(), "repository closed");
        }
        Return::Ok
    }

    fn put(&self, key: Key<'_>, value: InputBlock<'_>) -> Return {
        let db = self.db.acquire_read();
        let Some(handle) = db.as_ref() else {
            return Return::NotSupported;
        };
        match insert(handle, key.data(), value.data()) {
            Ok(true) => Return::KeyHeretoforeIncluded,
            Ok(false) => Return::Ok,
            Err(e) => self.status("put block", &e),
        }
    }

    fn get(&self, key: Key<'_>, out_value: &mut OutputBlock) -> Return {
        let db = self.db.acquire_read();
        let Some(handle) = db.as_ref() else {
            return Return::NotSupported;
        };
        match fetch(handle, key.data(), out_value) {
            Ok(true) => Return::Ok,
            Ok(false) => Return::KeyNotPresent,
            Err(e) => self.status("get block", &e),
        }
    }

    fn drop_key(&self, key: Key<'_>) -> Return {
        let db = self.db.acquire_read();
        let Some(handle) = db.as_ref() else {
            return Return::NotSupported;
        };
        match remove(handle, key.data()) {
            Ok(()) => Return::Ok,
            Err(e) => self.status("drop block", &e),
        }
    }

    fn included(&self, key: Key<'_>) -> bool {
        let db = self.db.acquire_read();
        db.as_ref()
            .is_some_and(|handle| match contains(handle, key.data()) {
                Ok(found) => found,
                Err(e) => {
                    let _ = self.status("look up block", &e);
                    false
                }
            })
    }

    fn excluded(&self, key: Key<'_>) -> bool {
        let db = self.db.acquire_read();
        db.as_ref()
            .is_some_and(|handle| match contains(handle, key.data()) {
                Ok(found) => !found,
                Err(e) => {
                    let _ = self.status("look up block", &e);
                    false
                }
            })
    }

    fn erase(&self) -> Return {
        let db = self.db.acquire_write();
        if db.is_some() {
            return Return::NotSupported;
        }
        let path = self.config.database_path();
        match fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), "repository erased"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "nothing to erase");
            }
            Err(e) => return self.status("erase repository", &BackendError::from(e)),
        }
        // only removed once nothing else lives there
        if fs::remove_dir(&self.config.data_dir).is_ok() {
            debug!(dir = %self.config.data_dir.display(), "data directory removed");
        }
        Return::Ok
    }
}

impl std::fmt::Debug for RedbRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbRepository")
            .field("config", &self.config)
            .field("opened", &self.opened())
            .finish()
    }
}
