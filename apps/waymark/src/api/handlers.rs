//! # API Endpoint Handlers
//!
//! Every mutating handler returns the render instructions the engine emitted
//! since the previous response, so a front end that applies each response in
//! order stays in sync with the engine.

use super::{
    AppState,
    types::{
        CodeRequest, CodeResponse, ErrorResponse, HealthResponse, PositionRequest,
        PositionResponse, SceneResponse, StatusResponse,
    },
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get hunt status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;

    let response = StatusResponse {
        hunt: engine.snapshot(),
        arrival_threshold_m: engine.arrival_threshold_m(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// POSITION HANDLER
// =============================================================================

/// Feed a position fix.
pub async fn position_handler(
    State(state): State<AppState>,
    Json(request): Json<PositionRequest>,
) -> Response {
    let sample = match request.to_sample() {
        Ok(sample) => sample,
        Err(e) => {
            tracing::debug!("Rejected position: {}", e);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response();
        }
    };

    let mut engine = state.engine.write().await;
    let arrived = engine.on_position_sample(&sample);

    let response = PositionResponse {
        arrived,
        state: engine.state(),
        distance_m: engine.snapshot().last_distance_m,
        instructions: engine.surface_mut().drain(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

// =============================================================================
// CODE HANDLER
// =============================================================================

/// Submit a passphrase.
///
/// Any string is a submission. Codes longer than any catalog passphrase can
/// never match, so they get a wrong-code hint like every other miss.
pub async fn code_handler(
    State(state): State<AppState>,
    Json(request): Json<CodeRequest>,
) -> impl IntoResponse {
    let mut engine = state.engine.write().await;
    let accepted = engine.try_code(&request.code);

    let response = CodeResponse {
        accepted,
        state: engine.state(),
        instructions: engine.surface_mut().drain(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// SCENE HANDLER
// =============================================================================

/// Redraw everything for the current state.
pub async fn scene_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut engine = state.engine.write().await;
    engine.surface_mut().drain();
    engine.redraw();

    let response = SceneResponse {
        state: engine.state(),
        instructions: engine.surface_mut().drain(),
    };

    (StatusCode::OK, Json(response))
}
