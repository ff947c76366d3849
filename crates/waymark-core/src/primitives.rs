//! # Hunt Primitives
//!
//! Fixed runtime constants for the Waymark engine.
//!
//! Defaults here are what the engine uses when no configuration overrides
//! them. Limits bound the size of catalog input so a hostile or corrupted
//! catalog file cannot exhaust memory.

/// Default arrival radius around a goal coordinate, in meters.
///
/// A position sample strictly closer than this to the goal counts as arrival.
pub const DEFAULT_ARRIVAL_THRESHOLD_M: f64 = 10.0;

/// Mean Earth radius in meters (IUGG mean radius, the sphere used for
/// great-circle lengths by common web-mapping libraries).
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;

/// Storage key of the progress record.
///
/// The suffix is the record schema version; bump it when the record
/// layout changes so old records are ignored instead of misread.
pub const PROGRESS_KEY: &str = "waymark.progress.v1";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of stages in one catalog.
pub const MAX_STAGES: usize = 1024;

/// Maximum number of coordinates in one stage path.
pub const MAX_PATH_POINTS: usize = 100_000;

/// Maximum number of hints in one stage's hint pool.
pub const MAX_HINTS: usize = 256;

/// Maximum length (bytes) of any text field: preamble, goal text, hint.
pub const MAX_TEXT_LENGTH: usize = 16 * 1024;

/// Maximum length (bytes) of a passphrase.
pub const MAX_PASSPHRASE_LENGTH: usize = 256;

/// Maximum catalog file size accepted by the loaders (bytes).
pub const MAX_CATALOG_BYTES: usize = 32 * 1024 * 1024;
