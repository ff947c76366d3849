//! # Stage Progression Engine
//!
//! The state machine at the center of a hunt.
//!
//! ## States
//!
//! | State | Meaning | Leaves on |
//! |-------|---------|-----------|
//! | `Traveling(i)` | walking stage `i`'s path | a sample inside stage `i`'s geofence |
//! | `AtGoal(i)` | standing at stage `i`'s goal | the correct passphrase for stage `i` |
//! | `Complete` | every stage done | never |
//!
//! Only the stage index is durable. `AtGoal` is re-derived from position after
//! a restart, so a reload always resumes in `Traveling(i)` or `Complete`.
//!
//! ## Ordering
//!
//! On a correct passphrase the new index is written to the progress store
//! before anything is shown, so a crash after the participant sees stage
//! `i+1` can never resume at stage `i`. A failed write is logged, remembered
//! in [`HuntStatus::last_save_failed`] and otherwise ignored: the engine still
//! advances, and a lost write only costs a re-walk of the last goal.

use crate::catalog::{StageCatalog, StageDefinition};
use crate::geofence::GeofenceEvaluator;
use crate::primitives::DEFAULT_ARRIVAL_THRESHOLD_M;
use crate::progress::{ProgressState, ProgressStore};
use crate::storage::KeyValueStore;
use crate::surface::{PresentationSurface, SegmentStyle, StageSegment};
use crate::PositionSample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Tunables for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Arrival radius around each goal, in meters.
    pub arrival_threshold_m: f64,
    /// Seed for hint selection. `None` seeds from the OS.
    pub hint_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            arrival_threshold_m: DEFAULT_ARRIVAL_THRESHOLD_M,
            hint_seed: None,
        }
    }
}

// =============================================================================
// HUNT STATE
// =============================================================================

/// Where the participant is in the hunt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum HuntState {
    Traveling(usize),
    AtGoal(usize),
    Complete,
}

impl HuntState {
    fn from_progress(progress: ProgressState, stage_count: usize) -> Self {
        if progress.is_complete(stage_count) {
            Self::Complete
        } else {
            Self::Traveling(progress.current_stage_index)
        }
    }

    /// Index of the stage being worked on, `None` once complete.
    #[must_use]
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            Self::Traveling(i) | Self::AtGoal(i) => Some(*i),
            Self::Complete => None,
        }
    }

    /// Whether the hunt is over.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for HuntState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Traveling(i) => write!(f, "traveling to goal {}", i + 1),
            Self::AtGoal(i) => write!(f, "at goal {}", i + 1),
            Self::Complete => write!(f, "complete"),
        }
    }
}

// =============================================================================
// STATUS SNAPSHOT
// =============================================================================

/// Read-only summary of an engine, for status displays and APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntStatus {
    pub title: Option<String>,
    pub state: HuntState,
    /// Durable stage index (`stage_count` once complete).
    pub current_stage_index: usize,
    pub stage_count: usize,
    pub preamble: Option<String>,
    /// Goal text, only while at a goal.
    pub goal_text: Option<String>,
    /// Distance to the active goal from the last evaluated sample.
    pub last_distance_m: Option<f64>,
    /// Whether the most recent progress write failed.
    pub last_save_failed: bool,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Stage progression engine.
///
/// Owns the hunt state and the progress store, and reports every visible
/// change to its presentation surface. One instance per participant; the
/// front end holds it directly (or behind its own lock), there is no global.
#[derive(Debug)]
pub struct HuntEngine<S, P> {
    catalog: StageCatalog,
    store: ProgressStore<S>,
    surface: P,
    geofence: GeofenceEvaluator,
    rng: StdRng,
    state: HuntState,
    last_rejected_code: Option<String>,
    last_distance_m: Option<f64>,
    last_save_failed: bool,
}

impl<S: KeyValueStore, P: PresentationSurface> HuntEngine<S, P> {
    /// Build an engine, restoring progress from `store`.
    ///
    /// A fresh store is initialized to stage 0 and persisted. The initial
    /// scene is drawn on `surface` before this returns.
    pub fn new(
        catalog: StageCatalog,
        mut store: ProgressStore<S>,
        surface: P,
        config: EngineConfig,
    ) -> Self {
        let progress = store.load(catalog.len());
        let state = HuntState::from_progress(progress, catalog.len());
        let rng = match config.hint_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        tracing::info!(
            stages = catalog.len(),
            stage = progress.current_stage_index,
            %state,
            "Hunt engine started"
        );

        let mut engine = Self {
            catalog,
            store,
            surface,
            geofence: GeofenceEvaluator::with_threshold(config.arrival_threshold_m),
            rng,
            state,
            last_rejected_code: None,
            last_distance_m: None,
            last_save_failed: false,
        };
        engine.draw_scene();
        engine
    }

    // =========================================================================
    // INPUT: POSITION
    // =========================================================================

    /// Feed one position sample.
    ///
    /// Does nothing unless traveling. Returns whether this sample caused
    /// arrival at the active goal.
    pub fn on_position_sample(&mut self, sample: &PositionSample) -> bool {
        let HuntState::Traveling(index) = self.state else {
            return false;
        };
        let Some(stage) = self.catalog.get(index) else {
            return false;
        };

        let arrival = self.geofence.evaluate(sample, stage.goal_position);
        self.last_distance_m = Some(arrival.distance_m);
        tracing::debug!(
            stage = index,
            distance_m = arrival.distance_m,
            accuracy_m = sample.accuracy_m,
            "Distance to goal"
        );

        if !arrival.arrived {
            return false;
        }

        tracing::info!(stage = index, distance_m = arrival.distance_m, "Arrived at goal");
        self.state = HuntState::AtGoal(index);
        self.last_rejected_code = None;
        let (position, text) = (stage.goal_position, stage.goal_text.clone());
        self.surface.show_goal_marker(position);
        self.surface.show_goal_panel(&text);
        true
    }

    // =========================================================================
    // INPUT: PASSPHRASE
    // =========================================================================

    /// Submit a passphrase. Returns whether the hunt advanced.
    ///
    /// Only a code submitted at a goal can advance. An empty code is ignored
    /// outright. A wrong code shows a random hint from the stage's pool,
    /// unless it is the same wrong code as the previous attempt.
    pub fn try_code(&mut self, code: &str) -> bool {
        if code.is_empty() {
            return false;
        }
        let HuntState::AtGoal(index) = self.state else {
            tracing::debug!(state = %self.state, "Code submitted away from a goal, ignored");
            return false;
        };
        let Some(stage) = self.catalog.get(index) else {
            return false;
        };

        if code == stage.passphrase {
            self.advance_from(index);
            return true;
        }

        if self.last_rejected_code.as_deref() == Some(code) {
            tracing::debug!(stage = index, "Same wrong code repeated, hint kept");
            return false;
        }

        let hint = pick_hint(&mut self.rng, stage).to_string();
        tracing::info!(stage = index, "Wrong code");
        self.surface.show_wrong_hint(&hint);
        self.last_rejected_code = Some(code.to_string());
        false
    }

    fn advance_from(&mut self, index: usize) {
        let next = ProgressState::at(index).advanced();

        match self.store.save(next) {
            Ok(()) => self.last_save_failed = false,
            Err(e) => {
                tracing::warn!(stage = next.current_stage_index, error = %e, "Progress not saved");
                self.last_save_failed = true;
            }
        }

        self.state = HuntState::from_progress(next, self.catalog.len());
        self.last_rejected_code = None;
        self.last_distance_m = None;
        tracing::info!(from = index, state = %self.state, "Stage unlocked");

        self.surface.hide_goal_panel();
        self.draw_scene();
    }

    // =========================================================================
    // OUTPUT
    // =========================================================================

    /// Redraw everything for the current state.
    ///
    /// Use after a surface has been (re)attached or lost its contents.
    pub fn redraw(&mut self) {
        self.draw_scene();
    }

    fn draw_scene(&mut self) {
        let segments = self.visible_segments();
        self.surface.render_stages(&segments);

        match self.state {
            HuntState::Traveling(index) => {
                let preamble = self.catalog.get(index).and_then(StageDefinition::preamble);
                self.surface.show_preamble(preamble);
            }
            HuntState::AtGoal(index) => {
                if let Some(stage) = self.catalog.get(index) {
                    self.surface.show_preamble(stage.preamble());
                    self.surface.show_goal_marker(stage.goal_position);
                    self.surface.show_goal_panel(&stage.goal_text);
                }
            }
            HuntState::Complete => {
                self.surface.show_preamble(None);
                self.surface.show_completion();
            }
        }
    }

    /// Completed stages dimmed, the active one highlighted, later ones hidden.
    fn visible_segments(&self) -> Vec<StageSegment> {
        let active = self.state.stage_index().unwrap_or(self.catalog.len());
        self.catalog
            .stages()
            .iter()
            .enumerate()
            .take(active.saturating_add(1))
            .map(|(stage_index, stage)| StageSegment {
                stage_index,
                geometry: stage.path.clone(),
                style: if stage_index < active {
                    SegmentStyle::Past
                } else {
                    SegmentStyle::Active
                },
            })
            .collect()
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HuntState {
        self.state
    }

    /// Durable progress implied by the current state.
    #[must_use]
    pub fn progress(&self) -> ProgressState {
        ProgressState::at(self.state.stage_index().unwrap_or(self.catalog.len()))
    }

    /// The stage catalog.
    #[must_use]
    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    /// The progress store.
    #[must_use]
    pub fn store(&self) -> &ProgressStore<S> {
        &self.store
    }

    /// The presentation surface.
    #[must_use]
    pub fn surface(&self) -> &P {
        &self.surface
    }

    /// Mutable access to the presentation surface (e.g. to drain a log).
    pub fn surface_mut(&mut self) -> &mut P {
        &mut self.surface
    }

    /// Arrival radius in meters.
    #[must_use]
    pub fn arrival_threshold_m(&self) -> f64 {
        self.geofence.threshold_m()
    }

    /// Summary of the current state.
    #[must_use]
    pub fn snapshot(&self) -> HuntStatus {
        let stage = self.state.stage_index().and_then(|i| self.catalog.get(i));
        HuntStatus {
            title: self.catalog.title().map(str::to_string),
            state: self.state,
            current_stage_index: self.progress().current_stage_index,
            stage_count: self.catalog.len(),
            preamble: stage.and_then(StageDefinition::preamble).map(str::to_string),
            goal_text: match self.state {
                HuntState::AtGoal(_) => stage.map(|s| s.goal_text.clone()),
                _ => None,
            },
            last_distance_m: self.last_distance_m,
            last_save_failed: self.last_save_failed,
        }
    }
}

/// Uniform pick from a stage's hint pool.
fn pick_hint<'a>(rng: &mut StdRng, stage: &'a StageDefinition) -> &'a str {
    // Validated catalogs never have an empty pool.
    if stage.hints.is_empty() {
        return "";
    }
    let i = rng.random_range(0..stage.hints.len());
    stage.hints.get(i).map(String::as_str).unwrap_or_default()
}

// =============================================================================
// TESTS
// =============================================================================
