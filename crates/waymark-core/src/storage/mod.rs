//! # Key-Value Storage
//!
//! Device-local string storage underneath the progress store.
//!
//! The engine only ever needs "read the value under a key" and "overwrite the
//! value under a key", the same contract as browser local storage. Two
//! backends implement it:
//! - `MemoryStore`: BTreeMap, volatile (tests, demos, `--backend memory`)
//! - `RedbStore`: redb embedded database, one ACID commit per write

mod redb_store;

pub use redb_store::RedbStore;

use crate::HuntError;
use std::collections::BTreeMap;
use std::path::Path;

// =============================================================================
// STORE TRAIT
// =============================================================================

/// String key-value storage scoped to one device.
///
/// `set` is an idempotent overwrite: writing the same value twice leaves the
/// store in the same state as writing it once.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, HuntError>;

    /// Overwrite the value under `key`. Returns only after the write is durable
    /// for the backend.
    fn set(&mut self, key: &str, value: &str) -> Result<(), HuntError>;

    /// Delete the value under `key`. Returns whether a value was present.
    fn remove(&mut self, key: &str) -> Result<bool, HuntError>;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Volatile store backed by a `BTreeMap`.
///
/// Counts successful writes so callers can check write-through behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(key.into(), value.into());
        Self { entries, writes: 0 }
    }

    /// Number of successful `set` calls so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, HuntError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HuntError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, HuntError> {
        Ok(self.entries.remove(key).is_some())
    }
}

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Storage backend chosen at startup.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory map (volatile).
    InMemory(MemoryStore),
    /// Disk-backed map using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    /// Open or create a redb-backed store at `path`.
    pub fn open_redb(path: impl AsRef<Path>) -> Result<Self, HuntError> {
        Ok(Self::Persistent(RedbStore::open(path)?))
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }
}

impl KeyValueStore for StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, HuntError> {
        match self {
            Self::InMemory(store) => store.get(key),
            Self::Persistent(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HuntError> {
        match self {
            Self::InMemory(store) => store.set(key, value),
            Self::Persistent(store) => store.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<bool, HuntError> {
        match self {
            Self::InMemory(store) => store.remove(key),
            Self::Persistent(store) => store.remove(key),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
