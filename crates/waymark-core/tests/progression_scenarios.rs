//! # Progression Scenarios
//!
//! End-to-end walks through a three-stage hunt, checking the engine, the
//! progress store and the emitted instructions together.

use waymark_core::{
    EngineConfig, GeoPoint, HuntEngine, HuntState, InstructionLog, KeyValueStore, MemoryStore,
    PositionSample, ProgressState, ProgressStore, RenderInstruction, StageCatalog,
    StageDefinition, StorageBackend, primitives::PROGRESS_KEY,
};

// =============================================================================
// HELPERS
// =============================================================================

fn stage(code: &str, lat: f64) -> StageDefinition {
    StageDefinition {
        path: vec![GeoPoint::new(10.75, lat - 0.0005), GeoPoint::new(10.75, lat)],
        preamble: None,
        goal_text: format!("The code for this goal is {code}"),
        goal_position: GeoPoint::new(10.75, lat),
        passphrase: code.to_string(),
        hints: vec!["Not that one".to_string(), "Look closer".to_string()],
    }
}

fn abc_catalog() -> StageCatalog {
    StageCatalog::new(
        None,
        vec![stage("A", 59.91), stage("B", 59.912), stage("C", 59.914)],
    )
    .expect("valid catalog")
}

fn config() -> EngineConfig {
    EngineConfig {
        hint_seed: Some(42),
        ..EngineConfig::default()
    }
}

type Engine<S> = HuntEngine<S, InstructionLog>;

fn fresh_engine() -> Engine<MemoryStore> {
    HuntEngine::new(
        abc_catalog(),
        ProgressStore::new(MemoryStore::new()),
        InstructionLog::new(),
        config(),
    )
}

fn arrive<S: KeyValueStore>(engine: &mut Engine<S>) {
    let index = engine.state().stage_index().expect("hunt still running");
    let goal = engine.catalog().get(index).expect("stage").goal_position;
    let sample = PositionSample::new(goal, 4.0).expect("sample");
    assert!(engine.on_position_sample(&sample), "expected arrival");
}

fn stored_record(engine: &Engine<MemoryStore>) -> Option<String> {
    engine.store().backend().get(PROGRESS_KEY).expect("get")
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn code_before_arrival_is_a_no_op() {
    let mut engine = fresh_engine();

    assert!(!engine.try_code("A"));
    assert_eq!(engine.state(), HuntState::Traveling(0));
    assert!(engine.surface().hints().is_empty());
}

#[test]
fn abc_walkthrough_advances_and_persists() {
    let mut engine = fresh_engine();
    assert_eq!(stored_record(&engine).as_deref(), Some(r#"{"currentStepIndex":0}"#));

    arrive(&mut engine);
    assert!(engine.try_code("A"));
    assert_eq!(engine.state(), HuntState::Traveling(1));
    assert_eq!(stored_record(&engine).as_deref(), Some(r#"{"currentStepIndex":1}"#));

    assert!(!engine.try_code("X"));
    assert_eq!(engine.progress().current_stage_index, 1);
    assert_eq!(stored_record(&engine).as_deref(), Some(r#"{"currentStepIndex":1}"#));
}

#[test]
fn each_advance_writes_exactly_once() {
    let mut engine = fresh_engine();

    for code in ["A", "B", "C"] {
        arrive(&mut engine);
        engine.try_code("wrong");
        engine.try_code("");
        let before = engine.store().backend().write_count();
        assert!(engine.try_code(code));
        assert_eq!(engine.store().backend().write_count(), before + 1);
    }
}

#[test]
fn wrong_code_at_goal_keeps_index() {
    let mut engine = fresh_engine();
    arrive(&mut engine);
    let writes = engine.store().backend().write_count();

    assert!(!engine.try_code("B"));
    assert!(!engine.try_code("a"));
    assert!(!engine.try_code("A "));

    assert_eq!(engine.state(), HuntState::AtGoal(0));
    assert_eq!(engine.store().backend().write_count(), writes);
}

#[test]
fn final_goal_completes_and_later_codes_return_false() {
    let mut engine = fresh_engine();
    for code in ["A", "B"] {
        arrive(&mut engine);
        assert!(engine.try_code(code));
    }
    arrive(&mut engine);
    assert!(engine.try_code("C"));

    assert_eq!(engine.state(), HuntState::Complete);
    assert_eq!(stored_record(&engine).as_deref(), Some(r#"{"currentStepIndex":3}"#));

    engine.surface_mut().drain();
    for code in ["C", "A", "", "anything"] {
        assert!(!engine.try_code(code));
    }
    let goal = engine.catalog().get(2).expect("stage").goal_position;
    assert!(!engine.on_position_sample(&PositionSample::new(goal, 1.0).expect("sample")));
    assert!(engine.surface().is_empty());
}

#[test]
fn only_reached_stages_are_drawn() {
    let mut engine = fresh_engine();
    arrive(&mut engine);
    engine.try_code("A");

    let last_render = engine
        .surface()
        .instructions()
        .iter()
        .rev()
        .find_map(|i| match i {
            RenderInstruction::RenderStages { stages } => Some(stages.clone()),
            _ => None,
        })
        .expect("a render");

    let indices: Vec<_> = last_render.iter().map(|s| s.stage_index).collect();
    assert_eq!(indices, vec![0, 1]);
}

#[test]
fn stale_sample_after_advance_is_harmless() {
    let mut engine = fresh_engine();
    let first_goal = engine.catalog().get(0).expect("stage").goal_position;
    arrive(&mut engine);
    engine.try_code("A");

    let stale = PositionSample::new(first_goal, 4.0).expect("sample");
    assert!(!engine.on_position_sample(&stale));
    assert_eq!(engine.state(), HuntState::Traveling(1));
}

// =============================================================================
// RELOAD
// =============================================================================

#[test]
fn reload_resumes_traveling_at_saved_stage() {
    let mut engine = fresh_engine();
    arrive(&mut engine);
    engine.try_code("A");
    arrive(&mut engine);

    let backend = engine.store().backend().clone();
    let reloaded: Engine<MemoryStore> = HuntEngine::new(
        abc_catalog(),
        ProgressStore::new(backend),
        InstructionLog::new(),
        config(),
    );

    // Arrival is not durable.
    assert_eq!(reloaded.state(), HuntState::Traveling(1));
}

#[test]
fn stored_index_two_loads_as_two() {
    let backend = MemoryStore::with_entry(PROGRESS_KEY, r#"{"currentStepIndex":2}"#);
    let engine = HuntEngine::new(
        abc_catalog(),
        ProgressStore::new(backend),
        InstructionLog::new(),
        config(),
    );
    assert_eq!(engine.state(), HuntState::Traveling(2));
}

#[test]
fn malformed_record_loads_as_zero() {
    let backend = MemoryStore::with_entry(PROGRESS_KEY, "not json");
    let engine = HuntEngine::new(
        abc_catalog(),
        ProgressStore::new(backend),
        InstructionLog::new(),
        config(),
    );
    assert_eq!(engine.state(), HuntState::Traveling(0));
}

#[test]
fn record_past_catalog_end_loads_complete() {
    let backend = MemoryStore::with_entry(PROGRESS_KEY, r#"{"currentStepIndex":7}"#);
    let engine = HuntEngine::new(
        abc_catalog(),
        ProgressStore::new(backend),
        InstructionLog::new(),
        config(),
    );
    assert_eq!(engine.state(), HuntState::Complete);
    assert_eq!(
        engine.surface().instructions().last(),
        Some(&RenderInstruction::ShowCompletion)
    );
}

#[test]
fn redb_backend_survives_reopen() {
    let temp = tempfile::tempdir().expect("temp dir");
    let db_path = temp.path().join("progress.redb");

    {
        let backend = StorageBackend::open_redb(&db_path).expect("open");
        let mut engine = HuntEngine::new(
            abc_catalog(),
            ProgressStore::new(backend),
            InstructionLog::new(),
            config(),
        );
        arrive(&mut engine);
        assert!(engine.try_code("A"));
        arrive(&mut engine);
        assert!(engine.try_code("B"));
    }

    let mut store = ProgressStore::new(StorageBackend::open_redb(&db_path).expect("reopen"));
    assert_eq!(store.load(3), ProgressState::at(2));
}
