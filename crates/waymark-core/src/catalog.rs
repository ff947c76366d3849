//! # Stage Catalog
//!
//! The ordered, immutable list of stages that make up a hunt.
//!
//! A catalog is parsed once at startup and validated before the engine sees
//! it. After construction every stage is known to have a drawable path, a
//! reachable goal, a non-empty passphrase and at least one hint, so the engine
//! never has to re-check any of that.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "title": "Easter 2021",
//!   "stages": [
//!     {
//!       "path": { "type": "Feature", "geometry": { "type": "LineString", "coordinates": [[10.0, 59.0], [10.001, 59.001]] } },
//!       "preamble": "Follow the yellow line",
//!       "goalText": "Look under the bench",
//!       "goalPosition": [10.001, 59.001],
//!       "stepCode": "EGG",
//!       "wrongTexts": ["Not quite", "Try again"]
//!     }
//!   ]
//! }
//! ```
//!
//! `path` may also be a bare coordinate array or a bare `LineString`
//! geometry, and the whole file may be a bare array of stages.

use crate::primitives::{
    MAX_CATALOG_BYTES, MAX_HINTS, MAX_PASSPHRASE_LENGTH, MAX_PATH_POINTS, MAX_STAGES,
    MAX_TEXT_LENGTH,
};
use crate::{GeoPoint, HuntError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// =============================================================================
// STAGE DEFINITION
// =============================================================================

/// One leg of the hunt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Path to walk, drawn once the stage is active.
    #[serde(deserialize_with = "deserialize_path")]
    pub path: Vec<GeoPoint>,
    /// Text shown when the stage becomes active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    /// Text shown on arrival at the goal.
    #[serde(rename = "goalText")]
    pub goal_text: String,
    /// Center of the arrival geofence.
    #[serde(rename = "goalPosition")]
    pub goal_position: GeoPoint,
    /// Exact-match code found at the goal.
    #[serde(rename = "stepCode", alias = "passphrase")]
    pub passphrase: String,
    /// Pool of replies to a wrong code.
    #[serde(rename = "wrongTexts", alias = "wrongPassphraseHints")]
    pub hints: Vec<String>,
}

impl StageDefinition {
    /// Preamble text, treating an empty string as absent.
    #[must_use]
    pub fn preamble(&self) -> Option<&str> {
        self.preamble.as_deref().filter(|text| !text.is_empty())
    }

    fn validate(&self, index: usize) -> Result<(), HuntError> {
        let fail = |reason: String| HuntError::InvalidCatalog(format!("stage {index}: {reason}"));

        if self.path.len() < 2 {
            return Err(fail(format!(
                "path needs at least 2 coordinates, got {}",
                self.path.len()
            )));
        }
        if self.path.len() > MAX_PATH_POINTS {
            return Err(fail(format!(
                "path has {} coordinates (max {})",
                self.path.len(),
                MAX_PATH_POINTS
            )));
        }
        if let Some((i, point)) = self.path.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(fail(format!("path coordinate {i} out of range: {point:?}")));
        }
        if !self.goal_position.is_valid() {
            return Err(fail(format!(
                "goal position out of range: {:?}",
                self.goal_position
            )));
        }
        if self.goal_text.trim().is_empty() {
            return Err(fail("goal text is empty".to_string()));
        }
        if self.passphrase.is_empty() {
            return Err(fail("passphrase is empty".to_string()));
        }
        if self.passphrase.len() > MAX_PASSPHRASE_LENGTH {
            return Err(fail(format!(
                "passphrase longer than {MAX_PASSPHRASE_LENGTH} bytes"
            )));
        }
        if self.hints.is_empty() {
            return Err(fail("hint pool is empty".to_string()));
        }
        if self.hints.len() > MAX_HINTS {
            return Err(fail(format!(
                "{} hints (max {})",
                self.hints.len(),
                MAX_HINTS
            )));
        }
        if self.hints.iter().any(|hint| hint.trim().is_empty()) {
            return Err(fail("hint pool contains an empty hint".to_string()));
        }

        let texts = self
            .preamble
            .iter()
            .chain(std::iter::once(&self.goal_text))
            .chain(self.hints.iter());
        for text in texts {
            if text.len() > MAX_TEXT_LENGTH {
                return Err(fail(format!("text longer than {MAX_TEXT_LENGTH} bytes")));
            }
        }

        Ok(())
    }
}

// =============================================================================
// PATH GEOMETRY (GeoJSON-compatible input)
// =============================================================================

#[derive(Deserialize)]
struct LineStringGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<GeoPoint>,
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<Vec<GeoPoint>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = Value::deserialize(deserializer)?;
    if raw.is_array() {
        return serde_json::from_value(raw).map_err(|e| D::Error::custom(format!("path: {e}")));
    }

    let Value::Object(mut object) = raw else {
        return Err(D::Error::custom(
            "path must be a coordinate array, a GeoJSON Feature or a LineString geometry",
        ));
    };
    let geometry = match object.get("type").and_then(Value::as_str) {
        Some("Feature") => object
            .remove("geometry")
            .ok_or_else(|| D::Error::custom("path Feature has no geometry"))?,
        _ => Value::Object(object),
    };

    let geometry: LineStringGeometry = serde_json::from_value(geometry)
        .map_err(|e| D::Error::custom(format!("path geometry: {e}")))?;
    if geometry.kind != "LineString" {
        return Err(D::Error::custom(format!(
            "path geometry must be a LineString, got {}",
            geometry.kind
        )));
    }
    Ok(geometry.coordinates)
}

// =============================================================================
// STAGE CATALOG
// =============================================================================

/// Top level of a titled catalog file. Stages stay raw so each one is
/// decoded on its own and errors can name it.
#[derive(Deserialize)]
struct TitledCatalog {
    #[serde(default)]
    title: Option<String>,
    stages: Vec<Value>,
}

fn decode_stage(index: usize, raw: Value) -> Result<StageDefinition, HuntError> {
    serde_json::from_value(raw)
        .map_err(|e| HuntError::InvalidCatalog(format!("stage {index}: {e}")))
}

/// A validated, non-empty, ordered list of stages.
///
/// Stage indices are contiguous `0..len()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCatalog {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    stages: Vec<StageDefinition>,
}

impl StageCatalog {
    /// Build a catalog from stage definitions, validating every stage.
    pub fn new(title: Option<String>, stages: Vec<StageDefinition>) -> Result<Self, HuntError> {
        let catalog = Self { title, stages };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from JSON bytes.
    ///
    /// This is a pure transformation - no file I/O.
    pub fn from_json(bytes: &[u8]) -> Result<Self, HuntError> {
        if bytes.len() > MAX_CATALOG_BYTES {
            return Err(HuntError::InvalidCatalog(format!(
                "catalog size {} bytes exceeds maximum allowed {} bytes",
                bytes.len(),
                MAX_CATALOG_BYTES
            )));
        }

        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| HuntError::InvalidCatalog(format!("unparsable catalog: {e}")))?;

        let (title, raw_stages) = match value {
            Value::Array(stages) => (None, stages),
            Value::Object(_) => {
                let file: TitledCatalog = serde_json::from_value(value)
                    .map_err(|e| HuntError::InvalidCatalog(format!("catalog: {e}")))?;
                (file.title, file.stages)
            }
            _ => {
                return Err(HuntError::InvalidCatalog(
                    "catalog must be an object with stages or an array of stages".to_string(),
                ));
            }
        };

        if raw_stages.len() > MAX_STAGES {
            return Err(HuntError::InvalidCatalog(format!(
                "catalog has {} stages (max {})",
                raw_stages.len(),
                MAX_STAGES
            )));
        }

        let stages = raw_stages
            .into_iter()
            .enumerate()
            .map(|(index, raw)| decode_stage(index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(title, stages)
    }

    /// Serialize the catalog back to pretty JSON.
    pub fn to_json(&self) -> Result<String, HuntError> {
        serde_json::to_string_pretty(self).map_err(|e| HuntError::Serialization(e.to_string()))
    }

    /// Check the whole-catalog invariants and every stage.
    pub fn validate(&self) -> Result<(), HuntError> {
        if self.stages.is_empty() {
            return Err(HuntError::InvalidCatalog(
                "catalog has no stages".to_string(),
            ));
        }
        if self.stages.len() > MAX_STAGES {
            return Err(HuntError::InvalidCatalog(format!(
                "catalog has {} stages (max {})",
                self.stages.len(),
                MAX_STAGES
            )));
        }
        for (index, stage) in self.stages.iter().enumerate() {
            stage.validate(index)?;
        }
        Ok(())
    }

    /// Optional human-readable hunt title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Number of stages. Always at least 1.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always `false`: a validated catalog has at least one stage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&StageDefinition> {
        self.stages.get(index)
    }

    /// All stages in order.
    #[must_use]
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(code: &str) -> StageDefinition {
        StageDefinition {
            path: vec![GeoPoint::new(10.0, 59.0), GeoPoint::new(10.001, 59.001)],
            preamble: None,
            goal_text: "Under the bench".to_string(),
            goal_position: GeoPoint::new(10.001, 59.001),
            passphrase: code.to_string(),
            hints: vec!["Nope".to_string()],
        }
    }

    #[test]
    fn parses_geojson_feature_path() {
        let json = br#"{
            "title": "Easter",
            "stages": [{
                "path": {"type": "Feature", "properties": {}, "geometry": {"type": "LineString", "coordinates": [[10.0, 59.0], [10.001, 59.001]]}},
                "preamble": "Go north",
                "goalText": "Look up",
                "goalPosition": [10.001, 59.001],
                "stepCode": "EGG",
                "wrongTexts": ["Cold", "Colder"]
            }]
        }"#;

        let catalog = StageCatalog::from_json(json).expect("valid catalog");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.title(), Some("Easter"));

        let first = catalog.get(0).expect("stage 0");
        assert_eq!(first.path.len(), 2);
        assert_eq!(first.passphrase, "EGG");
        assert_eq!(first.preamble(), Some("Go north"));
        assert_eq!(first.hints.len(), 2);
    }

    #[test]
    fn parses_bare_stage_array_with_long_field_names() {
        let json = br#"[{
            "path": [[10.0, 59.0], [10.001, 59.001]],
            "goalText": "Look down",
            "goalPosition": [10.001, 59.001],
            "passphrase": "HEN",
            "wrongPassphraseHints": ["No"]
        }]"#;

        let catalog = StageCatalog::from_json(json).expect("valid catalog");
        assert_eq!(catalog.title(), None);
        assert_eq!(catalog.get(0).map(|s| s.passphrase.as_str()), Some("HEN"));
    }

    #[test]
    fn rejects_non_linestring_geometry() {
        let json = br#"[{
            "path": {"type": "Point", "coordinates": [[10.0, 59.0], [10.0, 59.0]]},
            "goalText": "x", "goalPosition": [10.0, 59.0], "stepCode": "A", "wrongTexts": ["n"]
        }]"#;
        assert!(matches!(
            StageCatalog::from_json(json),
            Err(HuntError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn missing_field_error_names_stage_and_field() {
        let json = br#"{
            "stages": [
                {"path": [[10.0, 59.0], [10.001, 59.001]], "goalText": "a",
                 "goalPosition": [10.001, 59.001], "stepCode": "A", "wrongTexts": ["n"]},
                {"path": [[10.0, 59.0], [10.001, 59.001]],
                 "goalPosition": [10.001, 59.001], "stepCode": "B", "wrongTexts": ["n"]}
            ]
        }"#;

        let message = StageCatalog::from_json(json)
            .expect_err("must fail")
            .to_string();
        assert!(message.contains("stage 1"), "{message}");
        assert!(message.contains("goalText"), "{message}");
    }

    #[test]
    fn geometry_error_names_stage_and_kind() {
        let json = br#"{"title": "t", "stages": [{
            "path": {"type": "Feature", "geometry": {"type": "Point", "coordinates": [[10.0, 59.0]]}},
            "goalText": "x", "goalPosition": [10.0, 59.0], "stepCode": "A", "wrongTexts": ["n"]
        }]}"#;

        let message = StageCatalog::from_json(json)
            .expect_err("must fail")
            .to_string();
        assert!(message.contains("stage 0"), "{message}");
        assert!(message.contains("LineString"), "{message}");
    }

    #[test]
    fn coordinate_arity_error_is_reported() {
        let json = br#"[{
            "path": [[10.0, 59.0], [10.001]],
            "goalText": "x", "goalPosition": [10.0, 59.0], "stepCode": "A", "wrongTexts": ["n"]
        }]"#;

        let message = StageCatalog::from_json(json)
            .expect_err("must fail")
            .to_string();
        assert!(message.contains("stage 0"), "{message}");
        assert!(message.contains("2 or 3 elements"), "{message}");
    }

    #[test]
    fn rejects_scalar_catalog() {
        assert!(matches!(
            StageCatalog::from_json(b"42"),
            Err(HuntError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn rejects_empty_catalog() {
        assert!(matches!(
            StageCatalog::new(None, Vec::new()),
            Err(HuntError::InvalidCatalog(_))
        ));
        assert!(StageCatalog::from_json(b"[]").is_err());
    }

    #[test]
    fn rejects_empty_hint_pool() {
        let mut bad = stage("A");
        bad.hints.clear();
        let err = StageCatalog::new(None, vec![stage("Z"), bad]).expect_err("must fail");
        assert!(err.to_string().contains("stage 1"));
    }

    #[test]
    fn rejects_empty_passphrase() {
        assert!(StageCatalog::new(None, vec![stage("")]).is_err());
    }

    #[test]
    fn rejects_single_point_path() {
        let mut bad = stage("A");
        bad.path.truncate(1);
        assert!(StageCatalog::new(None, vec![bad]).is_err());
    }

    #[test]
    fn rejects_out_of_range_goal() {
        let mut bad = stage("A");
        bad.goal_position = GeoPoint::new(10.0, 95.0);
        assert!(StageCatalog::new(None, vec![bad]).is_err());
    }

    #[test]
    fn empty_preamble_counts_as_absent() {
        let mut s = stage("A");
        s.preamble = Some(String::new());
        assert_eq!(s.preamble(), None);
    }

    #[test]
    fn json_roundtrip_preserves_stages() {
        let catalog =
            StageCatalog::new(Some("t".to_string()), vec![stage("A"), stage("B")]).expect("valid");
        let json = catalog.to_json().expect("serialize");
        let restored = StageCatalog::from_json(json.as_bytes()).expect("reparse");
        assert_eq!(catalog, restored);
    }
}
