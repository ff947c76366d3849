//! # API Request/Response Types
//!
//! JSON bodies exchanged with the map front end.

use serde::{Deserialize, Serialize};
use waymark_core::{HuntError, HuntState, HuntStatus, PositionSample, RenderInstruction};

/// Accuracy assumed when a position report omits it (meters).
const DEFAULT_ACCURACY_M: f64 = 10.0;

// =============================================================================
// HEALTH
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Hunt status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub hunt: HuntStatus,
    pub arrival_threshold_m: f64,
}

// =============================================================================
// POSITION
// =============================================================================

/// One position fix from the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRequest {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl PositionRequest {
    /// Validate and convert to an engine sample.
    pub fn to_sample(&self) -> Result<PositionSample, HuntError> {
        PositionSample::from_lat_lon(
            self.lat,
            self.lon,
            self.accuracy.unwrap_or(DEFAULT_ACCURACY_M),
        )
    }
}

/// Result of feeding a position fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionResponse {
    pub arrived: bool,
    pub state: HuntState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    pub instructions: Vec<RenderInstruction>,
}

// =============================================================================
// CODE
// =============================================================================

/// A passphrase submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

/// Result of a passphrase submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeResponse {
    pub accepted: bool,
    pub state: HuntState,
    pub instructions: Vec<RenderInstruction>,
}

// =============================================================================
// SCENE
// =============================================================================

/// Full redraw of the current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneResponse {
    pub state: HuntState,
    pub instructions: Vec<RenderInstruction>,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body for rejected requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
