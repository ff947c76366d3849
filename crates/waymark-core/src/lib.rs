//! # waymark-core
//!
//! The stage progression engine for Waymark hunts.
//!
//! A hunt is an ordered list of stages. Each stage has a path to walk, a goal
//! coordinate with a circular arrival zone, and a passphrase posted at the
//! goal. The engine tracks which stage the participant is on, notices arrival
//! from live position samples, and unlocks the next stage only for the right
//! passphrase.
//!
//! ## Components
//!
//! - `catalog`: the validated stage list
//! - `geofence`: great-circle distance and the arrival check
//! - `storage` / `progress`: the durable progress record
//! - `surface`: declarative display instructions
//! - `engine`: the state machine tying them together
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (pure Rust)
//! - No UI: every visible effect goes through `PresentationSurface`
//! - Never panics on participant input or stored data; bad records are
//!   logged and repaired

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod engine;
pub mod geofence;
pub mod primitives;
pub mod progress;
pub mod storage;
pub mod surface;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{GeoPoint, HuntError, PositionSample};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use catalog::{StageCatalog, StageDefinition};
pub use engine::{EngineConfig, HuntEngine, HuntState, HuntStatus};
pub use geofence::{Arrival, GeofenceEvaluator, haversine_distance};
pub use progress::{ProgressRecord, ProgressState, ProgressStore};
pub use storage::{KeyValueStore, MemoryStore, RedbStore, StorageBackend};
pub use surface::{
    InstructionLog, PresentationSurface, RenderInstruction, SegmentStyle, StageSegment,
};
