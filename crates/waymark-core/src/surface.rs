//! # Presentation Surface
//!
//! The engine's only way of affecting what the participant sees.
//!
//! The engine never touches a map, a DOM or a terminal. It calls the
//! declarative methods of [`PresentationSurface`] and the surface decides how
//! to draw. [`InstructionLog`] is the stock surface: it records each call as a
//! serializable [`RenderInstruction`] for a front end to consume later.

use crate::GeoPoint;
use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE SEGMENTS
// =============================================================================

/// How a stage path is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStyle {
    /// Completed stage, dimmed.
    Past,
    /// Stage currently being walked, highlighted.
    Active,
}

/// One stage path to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSegment {
    pub stage_index: usize,
    pub geometry: Vec<GeoPoint>,
    pub style: SegmentStyle,
}

// =============================================================================
// SURFACE TRAIT
// =============================================================================

/// Receiver of the engine's display instructions.
///
/// `render_stages` replaces everything previously drawn on the map layer,
/// including any goal marker.
pub trait PresentationSurface {
    /// Redraw all visible stage paths.
    fn render_stages(&mut self, stages: &[StageSegment]);

    /// Place the goal marker at the active stage's goal.
    fn show_goal_marker(&mut self, position: GeoPoint);

    /// Show the goal text together with the passphrase input.
    fn show_goal_panel(&mut self, text: &str);

    /// Hide the goal text and passphrase input.
    fn hide_goal_panel(&mut self);

    /// Show the active stage's preamble, or hide the preamble area on `None`.
    fn show_preamble(&mut self, text: Option<&str>);

    /// Show the reply to a wrong passphrase.
    fn show_wrong_hint(&mut self, text: &str);

    /// Show the end-of-hunt state. Surfaces without one can ignore it.
    fn show_completion(&mut self) {}
}

// =============================================================================
// RECORDED INSTRUCTIONS
// =============================================================================

/// A surface call captured as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderInstruction {
    RenderStages { stages: Vec<StageSegment> },
    ShowGoalMarker { position: GeoPoint },
    ShowGoalPanel { text: String },
    HideGoalPanel,
    ShowPreamble { text: Option<String> },
    ShowWrongHint { text: String },
    ShowCompletion,
}

/// Surface that records every call in order.
#[derive(Debug, Clone, Default)]
pub struct InstructionLog {
    instructions: Vec<RenderInstruction>,
}

impl InstructionLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instructions recorded so far.
    #[must_use]
    pub fn instructions(&self) -> &[RenderInstruction] {
        &self.instructions
    }

    /// Take all recorded instructions, leaving the log empty.
    pub fn drain(&mut self) -> Vec<RenderInstruction> {
        std::mem::take(&mut self.instructions)
    }

    /// Number of recorded instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Hints shown so far, in order.
    #[must_use]
    pub fn hints(&self) -> Vec<&str> {
        self.instructions
            .iter()
            .filter_map(|i| match i {
                RenderInstruction::ShowWrongHint { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl PresentationSurface for InstructionLog {
    fn render_stages(&mut self, stages: &[StageSegment]) {
        self.instructions.push(RenderInstruction::RenderStages {
            stages: stages.to_vec(),
        });
    }

    fn show_goal_marker(&mut self, position: GeoPoint) {
        self.instructions
            .push(RenderInstruction::ShowGoalMarker { position });
    }

    fn show_goal_panel(&mut self, text: &str) {
        self.instructions.push(RenderInstruction::ShowGoalPanel {
            text: text.to_string(),
        });
    }

    fn hide_goal_panel(&mut self) {
        self.instructions.push(RenderInstruction::HideGoalPanel);
    }

    fn show_preamble(&mut self, text: Option<&str>) {
        self.instructions.push(RenderInstruction::ShowPreamble {
            text: text.map(str::to_string),
        });
    }

    fn show_wrong_hint(&mut self, text: &str) {
        self.instructions.push(RenderInstruction::ShowWrongHint {
            text: text.to_string(),
        });
    }

    fn show_completion(&mut self) {
        self.instructions.push(RenderInstruction::ShowCompletion);
    }
}
