//! # Waymark HTTP API Module
//!
//! The HTTP surface a map front end drives the engine through.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Current hunt status
//! - `GET /scene` - Full redraw instructions for the current state
//! - `POST /position` - Feed a position fix (`{lat, lon, accuracy}`)
//! - `POST /code` - Submit a passphrase (`{code}`)
//!
//! ## Configuration (Environment Variables)
//!
//! - `WAYMARK_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: the front end's dev server on port 1234)

mod handlers;
mod types;

pub use handlers::{
    code_handler, health_handler, position_handler, scene_handler, status_handler,
};
pub use types::{
    CodeRequest, CodeResponse, ErrorResponse, HealthResponse, PositionRequest, PositionResponse,
    SceneResponse, StatusResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use waymark_core::{HuntEngine, HuntError, InstructionLog, StorageBackend};

/// The engine type served over HTTP.
pub type ServedEngine = HuntEngine<StorageBackend, InstructionLog>;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state holding the one engine instance.
#[derive(Clone)]
pub struct AppState {
    /// The engine. Handlers take the lock for their whole run.
    pub engine: Arc<RwLock<ServedEngine>>,
}

impl AppState {
    /// Create new app state around an engine.
    #[must_use]
    pub fn new(engine: ServedEngine) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Origins of the map front end's local dev server.
const DEV_ORIGINS: [&str; 2] = ["http://localhost:1234", "http://127.0.0.1:1234"];

/// Build CORS layer from `WAYMARK_CORS_ORIGINS`.
///
/// `*` allows every origin. A comma-separated list allows those origins.
/// Unset, or a list with nothing valid in it, allows only [`DEV_ORIGINS`].
fn build_cors_layer() -> CorsLayer {
    let configured = std::env::var("WAYMARK_CORS_ORIGINS").ok();

    let origins = match configured.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: allowing all origins (WAYMARK_CORS_ORIGINS=*)");
            return CorsLayer::permissive();
        }
        Some(list) => {
            let origins = parse_origins(list);
            if origins.is_empty() {
                tracing::warn!("CORS: no valid origins in WAYMARK_CORS_ORIGINS, using dev origins");
                parse_origins(&DEV_ORIGINS.join(","))
            } else {
                origins
            }
        }
        None => parse_origins(&DEV_ORIGINS.join(",")),
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Parse a comma-separated origin list, skipping blanks and bad entries.
fn parse_origins(list: &str) -> Vec<HeaderValue> {
    list.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::info!(origin, "CORS: allowing origin");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(origin, error = %e, "CORS: invalid origin");
                None
            }
        })
        .collect()
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/scene", get(handlers::scene_handler))
        .route("/position", post(handlers::position_handler))
        .route("/code", post(handlers::code_handler))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, engine: ServedEngine) -> Result<(), HuntError> {
    let router = create_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| HuntError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Waymark HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| HuntError::Io(format!("Server error: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================
