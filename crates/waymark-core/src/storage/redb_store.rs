//! # redb-backed Key-Value Store
//!
//! A disk-backed store using the redb embedded database.
//!
//! Every `set` runs in its own write transaction and returns after commit,
//! so a stage transition persisted through this store survives a crash
//! that happens right after the call returns.

use super::KeyValueStore;
use crate::HuntError;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;

/// Table for stored records: key string -> value string
const RECORDS: TableDefinition<&str, &str> = TableDefinition::new("records");

/// A disk-backed string store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

fn io_err(e: impl std::fmt::Display) -> HuntError {
    HuntError::Io(e.to_string())
}

impl RedbStore {
    /// Open or create a store database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HuntError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Create the table up front so read transactions never see it missing
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(RECORDS).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), HuntError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<String>, HuntError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(RECORDS).map_err(io_err)?;
        let value = table
            .get(key)
            .map_err(io_err)?
            .map(|v| v.value().to_string());
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HuntError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| HuntError::PersistenceWrite(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(RECORDS)
                .map_err(|e| HuntError::PersistenceWrite(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| HuntError::PersistenceWrite(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| HuntError::PersistenceWrite(e.to_string()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, HuntError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let existed = {
            let mut table = write_txn.open_table(RECORDS).map_err(io_err)?;
            let removed = table.remove(key).map_err(io_err)?;
            removed.is_some()
        };
        write_txn.commit().map_err(io_err)?;
        Ok(existed)
    }
}
