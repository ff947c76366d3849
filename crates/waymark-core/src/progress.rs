//! # Progress Store
//!
//! Durable record of how far the participant has come.
//!
//! The record is a single JSON object, `{"currentStepIndex": <n>}`, stored
//! under a fixed versioned key. It is the only durable state of a hunt:
//! arrival at a goal is re-derived from position after a reload.
//!
//! `load` never fails. Anything wrong with the stored record is logged and
//! repaired in place:
//! - absent record -> index 0, persisted immediately
//! - unparsable record -> treated as absent
//! - index beyond the catalog -> clamped to "complete"

use crate::primitives::PROGRESS_KEY;
use crate::storage::KeyValueStore;
use crate::HuntError;
use serde::{Deserialize, Serialize};

// =============================================================================
// RECORD FORMAT
// =============================================================================

/// Wire form of the progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(rename = "currentStepIndex")]
    pub current_step_index: u64,
}

impl ProgressRecord {
    /// Encode as the stored JSON string.
    pub fn encode(&self) -> Result<String, HuntError> {
        serde_json::to_string(self).map_err(|e| HuntError::Serialization(e.to_string()))
    }

    /// Decode a stored JSON string.
    ///
    /// Negative, fractional or missing indices are malformed.
    pub fn decode(raw: &str) -> Result<Self, HuntError> {
        serde_json::from_str(raw).map_err(|e| HuntError::MalformedProgressRecord(e.to_string()))
    }
}

// =============================================================================
// PROGRESS STATE
// =============================================================================

/// The participant's current stage index.
///
/// `0 <= index < N` while the hunt runs; `index == N` once it is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ProgressState {
    pub current_stage_index: usize,
}

impl ProgressState {
    /// State for a participant who has not started.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            current_stage_index: 0,
        }
    }

    /// State at a given stage index.
    #[must_use]
    pub const fn at(index: usize) -> Self {
        Self {
            current_stage_index: index,
        }
    }

    /// Whether every stage of an `stage_count`-stage hunt is done.
    #[must_use]
    pub fn is_complete(&self, stage_count: usize) -> bool {
        self.current_stage_index >= stage_count
    }

    /// The state one stage further on.
    #[must_use]
    pub fn advanced(&self) -> Self {
        Self {
            current_stage_index: self.current_stage_index.saturating_add(1),
        }
    }

    fn to_record(self) -> ProgressRecord {
        ProgressRecord {
            current_step_index: self.current_stage_index as u64,
        }
    }
}

// =============================================================================
// PROGRESS STORE
// =============================================================================

/// Load/save contract for the progress record on top of a key-value store.
#[derive(Debug)]
pub struct ProgressStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> ProgressStore<S> {
    /// Create a store using the default record key.
    #[must_use]
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, PROGRESS_KEY)
    }

    /// Create a store using a custom record key.
    #[must_use]
    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// The record key in use.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reference to the underlying key-value store.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Give back the underlying key-value store.
    #[must_use]
    pub fn into_backend(self) -> S {
        self.backend
    }

    /// Load progress for a catalog of `stage_count` stages.
    ///
    /// Always returns a usable state; see the module docs for the repairs
    /// applied to missing or bad records. Repairs are written back at once.
    pub fn load(&mut self, stage_count: usize) -> ProgressState {
        let raw = match self.backend.get(&self.key) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Could not read progress record, starting over");
                None
            }
        };

        let Some(raw) = raw else {
            tracing::info!(key = %self.key, "No progress record, starting at stage 0");
            return self.reinitialize();
        };

        let record = match ProgressRecord::decode(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Discarding progress record");
                return self.reinitialize();
            }
        };

        let stored = record.current_step_index;
        if stored > stage_count as u64 {
            let e = HuntError::StaleStageIndex {
                stored,
                stage_count,
            };
            tracing::warn!(key = %self.key, error = %e, "Clamping progress to hunt complete");
            let clamped = ProgressState::at(stage_count);
            self.save_logged(clamped);
            return clamped;
        }

        let state = ProgressState::at(stored as usize);
        tracing::debug!(key = %self.key, stage = state.current_stage_index, "Loaded progress");
        state
    }

    /// Overwrite the stored record. Returns after the backend reports the
    /// write complete.
    pub fn save(&mut self, state: ProgressState) -> Result<(), HuntError> {
        let encoded = state.to_record().encode()?;
        self.backend.set(&self.key, &encoded)
    }

    /// Delete the stored record. Returns whether one existed.
    pub fn reset(&mut self) -> Result<bool, HuntError> {
        self.backend.remove(&self.key)
    }

    fn reinitialize(&mut self) -> ProgressState {
        let state = ProgressState::initial();
        self.save_logged(state);
        state
    }

    fn save_logged(&mut self, state: ProgressState) {
        if let Err(e) = self.save(state) {
            tracing::warn!(key = %self.key, error = %e, "Could not persist repaired progress record");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
