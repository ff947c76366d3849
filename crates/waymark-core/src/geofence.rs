//! # Geofence Evaluation
//!
//! Decides whether a position sample has arrived at a goal.
//!
//! Distances are great-circle lengths in meters on a sphere of mean Earth
//! radius (haversine), never planar distances in projected map units.

use crate::primitives::{DEFAULT_ARRIVAL_THRESHOLD_M, EARTH_MEAN_RADIUS_M};
use crate::{GeoPoint, PositionSample};

/// Great-circle distance in meters between two coordinates.
#[must_use]
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let central_angle = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_MEAN_RADIUS_M * central_angle
}

/// Result of evaluating one sample against one goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrival {
    /// Distance from the sample to the goal, in meters.
    pub distance_m: f64,
    /// Whether the sample is inside the geofence.
    pub arrived: bool,
}

/// Stateless arrival check with a fixed radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceEvaluator {
    threshold_m: f64,
}

impl Default for GeofenceEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl GeofenceEvaluator {
    /// Create an evaluator with the default 10 m radius.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold_m: DEFAULT_ARRIVAL_THRESHOLD_M,
        }
    }

    /// Create an evaluator with a custom radius.
    ///
    /// Non-finite or non-positive radii fall back to the default.
    #[must_use]
    pub fn with_threshold(threshold_m: f64) -> Self {
        if threshold_m.is_finite() && threshold_m > 0.0 {
            Self { threshold_m }
        } else {
            tracing::warn!(
                threshold_m,
                "Ignoring invalid arrival threshold, using default {} m",
                DEFAULT_ARRIVAL_THRESHOLD_M
            );
            Self::new()
        }
    }

    /// The arrival radius in meters.
    #[must_use]
    pub fn threshold_m(&self) -> f64 {
        self.threshold_m
    }

    /// Evaluate a sample against a goal.
    ///
    /// A sample exactly on the goal (distance 0) always arrives; one at
    /// exactly the threshold does not.
    #[must_use]
    pub fn evaluate(&self, sample: &PositionSample, goal: GeoPoint) -> Arrival {
        let distance_m = haversine_distance(sample.position, goal);
        Arrival {
            distance_m,
            arrived: distance_m < self.threshold_m,
        }
    }

    /// Shorthand for `evaluate(..).arrived`.
    #[must_use]
    pub fn has_arrived(&self, sample: &PositionSample, goal: GeoPoint) -> bool {
        self.evaluate(sample, goal).arrived
    }
}

// =============================================================================
// TESTS
// =============================================================================
