//! # CLI Command Implementations

use serde::{Deserialize, Serialize};
use std::path::Path;
use waymark::api::{self, PositionRequest};
use waymark::config::{Backend, Settings};
use waymark_core::{
    HuntEngine, HuntError, HuntState, InstructionLog, ProgressStore, RedbStore, RenderInstruction,
    StageCatalog, StorageBackend, primitives::MAX_CATALOG_BYTES,
};

/// Maximum walk script size (10 MB).
const MAX_SCRIPT_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), HuntError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        HuntError::Io(format!(
            "Cannot read file metadata '{}': {}",
            path.display(),
            e
        ))
    })?;

    if metadata.len() > max_size {
        return Err(HuntError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

fn read_file(path: &Path, max_size: u64) -> Result<Vec<u8>, HuntError> {
    validate_file_size(path, max_size)?;
    std::fs::read(path)
        .map_err(|e| HuntError::Io(format!("Cannot read '{}': {}", path.display(), e)))
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load and validate the stage catalog.
pub fn load_catalog(path: &Path) -> Result<StageCatalog, HuntError> {
    let bytes = read_file(path, MAX_CATALOG_BYTES as u64)?;
    StageCatalog::from_json(&bytes)
}

/// Open the progress backend named in `settings`.
pub fn open_backend(settings: &Settings) -> Result<StorageBackend, HuntError> {
    match settings.backend {
        Backend::Redb => StorageBackend::open_redb(&settings.database),
        Backend::Memory => Ok(StorageBackend::default()),
    }
}

/// Build an engine with its progress restored and its initial scene drawn.
pub fn open_engine(settings: &Settings) -> Result<api::ServedEngine, HuntError> {
    let catalog = load_catalog(&settings.catalog)?;
    let store = ProgressStore::with_key(open_backend(settings)?, settings.progress_key.as_str());
    Ok(HuntEngine::new(
        catalog,
        store,
        InstructionLog::new(),
        settings.engine,
    ))
}

/// One-line human rendering of an instruction.
#[must_use]
pub fn describe_instruction(instruction: &RenderInstruction) -> String {
    match instruction {
        RenderInstruction::RenderStages { stages } => {
            let active = stages
                .iter()
                .filter(|s| s.style == waymark_core::SegmentStyle::Active)
                .count();
            format!("draw {} path(s), {} active", stages.len(), active)
        }
        RenderInstruction::ShowGoalMarker { position } => format!("goal marker at {}", position),
        RenderInstruction::ShowGoalPanel { text } => format!("goal: {}", text),
        RenderInstruction::HideGoalPanel => "goal panel hidden".to_string(),
        RenderInstruction::ShowPreamble { text: Some(text) } => format!("preamble: {}", text),
        RenderInstruction::ShowPreamble { text: None } => "preamble hidden".to_string(),
        RenderInstruction::ShowWrongHint { text } => format!("hint: {}", text),
        RenderInstruction::ShowCompletion => "hunt complete".to_string(),
    }
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Check that the catalog loads.
pub fn cmd_validate(settings: &Settings, json_mode: bool) -> Result<(), HuntError> {
    let catalog = load_catalog(&settings.catalog)?;

    if json_mode {
        let output = serde_json::json!({
            "catalog": settings.catalog.to_string_lossy(),
            "title": catalog.title(),
            "stage_count": catalog.len(),
            "path_points": catalog.stages().iter().map(|s| s.path.len()).collect::<Vec<_>>(),
            "hint_counts": catalog.stages().iter().map(|s| s.hints.len()).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Catalog OK: {}", settings.catalog.display());
    if let Some(title) = catalog.title() {
        println!("Title:  {}", title);
    }
    println!("Stages: {}", catalog.len());
    for (i, stage) in catalog.stages().iter().enumerate() {
        println!(
            "  {:>3}. goal {}  ({} path points, {} hints)",
            i,
            stage.goal_position,
            stage.path.len(),
            stage.hints.len()
        );
    }

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show stored progress.
pub fn cmd_status(settings: &Settings, json_mode: bool) -> Result<(), HuntError> {
    let engine = open_engine(settings)?;
    let status = engine.snapshot();

    if json_mode {
        let output = serde_json::json!({
            "catalog": settings.catalog.to_string_lossy(),
            "backend": settings.backend.to_string(),
            "database": settings.database.to_string_lossy(),
            "status": status,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Waymark Hunt Status");
    println!("===================");
    println!("Catalog:  {}", settings.catalog.display());
    println!("Backend:  {}", settings.backend);
    if settings.backend == Backend::Redb {
        println!("Database: {}", settings.database.display());
    }
    println!();
    if let Some(title) = &status.title {
        println!("Hunt:     {}", title);
    }
    println!(
        "Stage:    {} of {}",
        status.current_stage_index.min(status.stage_count),
        status.stage_count
    );
    println!("State:    {}", status.state);
    if let Some(preamble) = &status.preamble {
        println!("Preamble: {}", preamble);
    }

    Ok(())
}

// =============================================================================
// WALK COMMAND
// =============================================================================

/// One entry of a walk script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkStep {
    /// A position fix: `{"position": {"lat": .., "lon": .., "accuracy": ..}}`.
    Position(PositionRequest),
    /// A passphrase entry: `{"code": ".."}`.
    Code(String),
    /// A full redraw: `"redraw"`.
    Redraw,
}

/// What one step did.
#[derive(Debug, Clone, Serialize)]
pub struct WalkOutcome {
    pub step: usize,
    pub input: WalkStep,
    /// Arrival for positions, acceptance for codes.
    pub effect: bool,
    pub state: HuntState,
    pub instructions: Vec<RenderInstruction>,
}

/// Parse a walk script.
pub fn parse_walk_script(bytes: &[u8]) -> Result<Vec<WalkStep>, HuntError> {
    serde_json::from_slice(bytes)
        .map_err(|e| HuntError::Serialization(format!("Invalid walk script: {}", e)))
}

/// Run every step of a script against `engine`.
///
/// Positions that fail validation are logged and count as no arrival.
pub fn run_walk(engine: &mut api::ServedEngine, steps: Vec<WalkStep>) -> Vec<WalkOutcome> {
    let mut outcomes = Vec::with_capacity(steps.len());

    for (i, step) in steps.into_iter().enumerate() {
        let effect = match &step {
            WalkStep::Position(request) => match request.to_sample() {
                Ok(sample) => engine.on_position_sample(&sample),
                Err(e) => {
                    tracing::warn!(step = i + 1, "Skipping position: {}", e);
                    false
                }
            },
            WalkStep::Code(code) => engine.try_code(code),
            WalkStep::Redraw => {
                engine.redraw();
                false
            }
        };

        outcomes.push(WalkOutcome {
            step: i + 1,
            input: step,
            effect,
            state: engine.state(),
            instructions: engine.surface_mut().drain(),
        });
    }

    outcomes
}

/// Replay a walk script.
pub fn cmd_walk(settings: &Settings, json_mode: bool, file: &Path) -> Result<(), HuntError> {
    tracing::info!("Walking script {}", file.display());

    let steps = parse_walk_script(&read_file(file, MAX_SCRIPT_FILE_SIZE)?)?;
    let mut engine = open_engine(settings)?;
    let initial = engine.surface_mut().drain();
    let start = engine.state();
    let outcomes = run_walk(&mut engine, steps);

    if json_mode {
        let output = serde_json::json!({
            "initial": { "state": start, "instructions": initial },
            "steps": outcomes,
            "final": engine.snapshot(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("[start] {}", start);
    for instruction in &initial {
        println!("        {}", describe_instruction(instruction));
    }
    for outcome in &outcomes {
        let label = match &outcome.input {
            WalkStep::Position(p) => format!(
                "position {:.6},{:.6}{}",
                p.lat,
                p.lon,
                if outcome.effect { " (arrived)" } else { "" }
            ),
            WalkStep::Code(code) => format!(
                "code {:?}{}",
                code,
                if outcome.effect { " (accepted)" } else { "" }
            ),
            WalkStep::Redraw => "redraw".to_string(),
        };
        println!("[{:>5}] {} -> {}", outcome.step, label, outcome.state);
        for instruction in &outcome.instructions {
            println!("        {}", describe_instruction(instruction));
        }
    }

    let status = engine.snapshot();
    if status.last_save_failed {
        tracing::warn!("Last progress write failed; progress may not survive a restart");
    }

    Ok(())
}

// =============================================================================
// RESET COMMAND
// =============================================================================

/// Erase stored progress.
pub fn cmd_reset(settings: &Settings, json_mode: bool) -> Result<(), HuntError> {
    let removed = match settings.backend {
        Backend::Redb => {
            let mut store = ProgressStore::with_key(
                RedbStore::open(&settings.database)?,
                settings.progress_key.as_str(),
            );
            let removed = store.reset()?;
            let mut db = store.into_backend();
            if let Err(e) = db.compact() {
                tracing::debug!("Compaction skipped: {}", e);
            }
            removed
        }
        Backend::Memory => {
            tracing::info!("Memory backend keeps no progress between runs");
            false
        }
    };

    if json_mode {
        let output = serde_json::json!({
            "backend": settings.backend.to_string(),
            "key": settings.progress_key,
            "removed": removed,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    if removed {
        println!("Progress erased ({})", settings.progress_key);
    } else {
        println!("No stored progress");
    }
    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(settings: &Settings) -> Result<(), HuntError> {
    let engine = open_engine(settings)?;

    println!("Waymark Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:      {}", settings.host);
    println!("  Port:      {}", settings.port);
    println!("  Catalog:   {}", settings.catalog.display());
    println!("  Backend:   {}", settings.backend);
    println!("  Threshold: {} m", settings.engine.arrival_threshold_m);
    println!();
    println!("Endpoints:");
    println!("  POST /position - Feed a position fix");
    println!("  POST /code     - Submit a passphrase");
    println!("  GET  /scene    - Redraw the current state");
    println!("  GET  /status   - Get hunt status");
    println!("  GET  /health   - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", settings.host, settings.port);
    api::run_server(&addr, engine).await
}
