//! # Core Type Definitions
//!
//! This module contains the shared value types of the engine:
//! - Geographic coordinates (`GeoPoint`)
//! - Live position input (`PositionSample`)
//! - Error types (`HuntError`)
//!
//! Coordinates follow GeoJSON conventions: longitude first, latitude second,
//! both in decimal degrees on WGS84.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// GEOGRAPHIC COORDINATE
// =============================================================================

/// A geographic coordinate in decimal degrees.
///
/// Serialized as a GeoJSON position `[lon, lat]`. A third element (altitude)
/// is accepted on input and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct GeoPoint {
    /// Longitude, degrees east, `-180..=180`.
    pub lon: f64,
    /// Latitude, degrees north, `-90..=90`.
    pub lat: f64,
}

impl GeoPoint {
    /// Create a coordinate from longitude and latitude.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Check that both components are finite and inside WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl TryFrom<Vec<f64>> for GeoPoint {
    type Error = String;

    fn try_from(position: Vec<f64>) -> Result<Self, Self::Error> {
        match position.as_slice() {
            [lon, lat] | [lon, lat, _] => Ok(Self::new(*lon, *lat)),
            other => Err(format!(
                "position must have 2 or 3 elements, got {}",
                other.len()
            )),
        }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.lon, point.lat]
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

// =============================================================================
// POSITION SAMPLE
// =============================================================================

/// One fix from the position source.
///
/// Transient: samples are evaluated and dropped, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Reported position.
    pub position: GeoPoint,
    /// Accuracy radius in meters as reported by the source.
    pub accuracy_m: f64,
}

impl PositionSample {
    /// Build a sample, rejecting fixes the source could not really provide.
    ///
    /// Returns `HuntError::PositionUnavailable` for out-of-range or
    /// non-finite coordinates and for a negative or non-finite accuracy.
    pub fn new(position: GeoPoint, accuracy_m: f64) -> Result<Self, HuntError> {
        if !position.is_valid() {
            return Err(HuntError::PositionUnavailable(format!(
                "coordinate out of range: lon={} lat={}",
                position.lon, position.lat
            )));
        }
        if !accuracy_m.is_finite() || accuracy_m < 0.0 {
            return Err(HuntError::PositionUnavailable(format!(
                "invalid accuracy radius: {}",
                accuracy_m
            )));
        }
        Ok(Self {
            position,
            accuracy_m,
        })
    }

    /// Convenience constructor taking latitude first, as position APIs report it.
    pub fn from_lat_lon(lat: f64, lon: f64, accuracy_m: f64) -> Result<Self, HuntError> {
        Self::new(GeoPoint::new(lon, lat), accuracy_m)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Waymark engine.
///
/// The engine itself never fails a participant action because of these:
/// storage and record problems are logged and recovered locally. They
/// surface as `Err` only from the lower-level building blocks (catalog
/// parsing, stores, sample construction).
#[derive(Debug, Error)]
pub enum HuntError {
    /// The stage catalog is empty, malformed, or violates a limit.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// The stored progress record could not be parsed.
    #[error("Malformed progress record: {0}")]
    MalformedProgressRecord(String),

    /// The stored stage index lies outside the loaded catalog.
    #[error("Stale stage index {stored} (catalog has {stage_count} stages)")]
    StaleStageIndex { stored: u64, stage_count: usize },

    /// The position source could not deliver a usable fix.
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    /// Writing the progress record failed.
    #[error("Persistence write failed: {0}")]
    PersistenceWrite(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O or storage engine error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================
