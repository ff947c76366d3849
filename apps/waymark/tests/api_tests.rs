//! Integration tests for the Waymark HTTP API.
//!
//! Uses axum-test to drive the handlers without starting a real server.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use waymark::api::{
    AppState, CodeResponse, ErrorResponse, HealthResponse, PositionResponse, SceneResponse,
    StatusResponse, create_router,
};
use waymark_core::{
    EngineConfig, GeoPoint, HuntEngine, HuntState, InstructionLog, ProgressStore,
    RenderInstruction, SegmentStyle, StageCatalog, StageDefinition, StorageBackend,
};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

const GOAL_LAT: [f64; 2] = [59.91, 59.912];
const GOAL_LON: f64 = 10.75;

fn stage(code: &str, lat: f64) -> StageDefinition {
    StageDefinition {
        path: vec![
            GeoPoint::new(GOAL_LON, lat - 0.001),
            GeoPoint::new(GOAL_LON, lat),
        ],
        preamble: Some(format!("Find {code}")),
        goal_text: format!("Say {code}"),
        goal_position: GeoPoint::new(GOAL_LON, lat),
        passphrase: code.to_string(),
        hints: vec!["Nope".to_string()],
    }
}

/// Test server over a fresh two-stage hunt with in-memory progress.
fn create_test_server() -> TestServer {
    let catalog = StageCatalog::new(
        Some("Test hunt".to_string()),
        vec![stage("tulip", GOAL_LAT[0]), stage("daffodil", GOAL_LAT[1])],
    )
    .unwrap();
    let engine = HuntEngine::new(
        catalog,
        ProgressStore::new(StorageBackend::default()),
        InstructionLog::new(),
        EngineConfig {
            hint_seed: Some(7),
            ..EngineConfig::default()
        },
    );
    TestServer::new(create_router(AppState::new(engine))).unwrap()
}

async fn arrive(server: &TestServer, stage: usize) -> PositionResponse {
    let response = server
        .post("/position")
        .json(&json!({"lat": GOAL_LAT[stage], "lon": GOAL_LON, "accuracy": 5.0}))
        .await;
    response.assert_status_ok();
    response.json()
}

async fn submit(server: &TestServer, code: &str) -> CodeResponse {
    let response = server.post("/code").json(&json!({ "code": code })).await;
    response.assert_status_ok();
    response.json()
}

// =============================================================================
// HEALTH & STATUS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_fresh_hunt() {
    let server = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.hunt.state, HuntState::Traveling(0));
    assert_eq!(status.hunt.stage_count, 2);
    assert_eq!(status.hunt.current_stage_index, 0);
    assert_eq!(status.hunt.title.as_deref(), Some("Test hunt"));
    assert_eq!(status.hunt.preamble.as_deref(), Some("Find tulip"));
    assert!((status.arrival_threshold_m - 10.0).abs() < 1e-9);
}

// =============================================================================
// SCENE
// =============================================================================

#[tokio::test]
async fn test_scene_draws_only_active_path() {
    let server = create_test_server();

    let response = server.get("/scene").await;

    response.assert_status_ok();
    let scene: SceneResponse = response.json();
    assert_eq!(scene.state, HuntState::Traveling(0));
    let Some(RenderInstruction::RenderStages { stages }) = scene.instructions.first() else {
        panic!("scene must start with the path layer: {:?}", scene.instructions);
    };
    assert_eq!(stages.len(), 1);
    assert_eq!(stages[0].stage_index, 0);
    assert_eq!(stages[0].style, SegmentStyle::Active);
    assert!(scene.instructions.contains(&RenderInstruction::ShowPreamble {
        text: Some("Find tulip".to_string())
    }));
}

#[tokio::test]
async fn test_scene_is_repeatable() {
    let server = create_test_server();

    let first: SceneResponse = server.get("/scene").await.json();
    let second: SceneResponse = server.get("/scene").await.json();

    assert_eq!(first.instructions, second.instructions);
}

// =============================================================================
// POSITION
// =============================================================================

#[tokio::test]
async fn test_position_far_away() {
    let server = create_test_server();

    let response = server
        .post("/position")
        .json(&json!({"lat": 59.95, "lon": GOAL_LON}))
        .await;

    response.assert_status_ok();
    let result: PositionResponse = response.json();
    assert!(!result.arrived);
    assert_eq!(result.state, HuntState::Traveling(0));
    assert!(result.distance_m.unwrap() > 1000.0);
}

#[tokio::test]
async fn test_position_at_goal() {
    let server = create_test_server();
    server.get("/scene").await;

    let result = arrive(&server, 0).await;

    assert!(result.arrived);
    assert_eq!(result.state, HuntState::AtGoal(0));
    assert!(result.instructions.contains(&RenderInstruction::ShowGoalMarker {
        position: GeoPoint::new(GOAL_LON, GOAL_LAT[0])
    }));
    assert!(result.instructions.contains(&RenderInstruction::ShowGoalPanel {
        text: "Say tulip".to_string()
    }));
}

#[tokio::test]
async fn test_position_out_of_range_rejected() {
    let server = create_test_server();

    let response = server
        .post("/position")
        .json(&json!({"lat": 95.0, "lon": GOAL_LON}))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = response.json();
    assert!(!error.error.is_empty());

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.hunt.state, HuntState::Traveling(0));
}

#[tokio::test]
async fn test_position_negative_accuracy_rejected() {
    let server = create_test_server();

    let response = server
        .post("/position")
        .json(&json!({"lat": GOAL_LAT[0], "lon": GOAL_LON, "accuracy": -1.0}))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// CODE
// =============================================================================

#[tokio::test]
async fn test_code_before_arrival_ignored() {
    let server = create_test_server();
    server.get("/scene").await;

    let result = submit(&server, "tulip").await;

    assert!(!result.accepted);
    assert_eq!(result.state, HuntState::Traveling(0));
    assert!(result.instructions.is_empty());
}

#[tokio::test]
async fn test_wrong_code_hint_shown_once() {
    let server = create_test_server();
    arrive(&server, 0).await;

    let first = submit(&server, "rose").await;
    let second = submit(&server, "rose").await;

    assert!(!first.accepted);
    assert_eq!(
        first.instructions,
        vec![RenderInstruction::ShowWrongHint {
            text: "Nope".to_string()
        }]
    );
    assert!(second.instructions.is_empty());
    assert_eq!(second.state, HuntState::AtGoal(0));
}

#[tokio::test]
async fn test_correct_code_advances() {
    let server = create_test_server();
    arrive(&server, 0).await;

    let result = submit(&server, "tulip").await;

    assert!(result.accepted);
    assert_eq!(result.state, HuntState::Traveling(1));
    assert!(result.instructions.contains(&RenderInstruction::HideGoalPanel));
    assert!(result.instructions.contains(&RenderInstruction::ShowPreamble {
        text: Some("Find daffodil".to_string())
    }));

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.hunt.current_stage_index, 1);
    assert!(!status.hunt.last_save_failed);
}

#[tokio::test]
async fn test_long_code_is_a_wrong_submission() {
    let server = create_test_server();
    arrive(&server, 0).await;

    let result = submit(&server, &"x".repeat(10_000)).await;

    assert!(!result.accepted);
    assert_eq!(result.state, HuntState::AtGoal(0));
    assert_eq!(
        result.instructions,
        vec![RenderInstruction::ShowWrongHint {
            text: "Nope".to_string()
        }]
    );
}

// =============================================================================
// FULL WALK
// =============================================================================

#[tokio::test]
async fn test_walk_to_completion() {
    let server = create_test_server();

    arrive(&server, 0).await;
    assert!(submit(&server, "tulip").await.accepted);
    arrive(&server, 1).await;
    let last = submit(&server, "daffodil").await;

    assert!(last.accepted);
    assert_eq!(last.state, HuntState::Complete);
    assert!(last.instructions.contains(&RenderInstruction::ShowCompletion));

    // Complete ignores every further input.
    let after = arrive(&server, 1).await;
    assert!(!after.arrived);
    assert_eq!(after.state, HuntState::Complete);
    assert!(!submit(&server, "daffodil").await.accepted);

    let scene: SceneResponse = server.get("/scene").await.json();
    let Some(RenderInstruction::RenderStages { stages }) = scene.instructions.first() else {
        panic!("scene must start with the path layer");
    };
    assert_eq!(stages.len(), 2);
    assert!(stages.iter().all(|s| s.style == SegmentStyle::Past));
}
