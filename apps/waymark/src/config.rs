//! # Configuration
//!
//! Settings come from three layers, later layers winning:
//! 1. Built-in defaults
//! 2. `waymark.toml` (or the file given with `--config`)
//! 3. CLI flags
//!
//! ## File Format
//!
//! ```toml
//! [hunt]
//! catalog = "hunts/easter.json"
//!
//! [geofence]
//! threshold_m = 10.0
//!
//! [hints]
//! seed = 42
//!
//! [storage]
//! backend = "redb"          # or "memory"
//! path = "waymark.redb"
//! key = "waymark.progress.v1"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```
//!
//! Every table and every field is optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use waymark_core::{EngineConfig, HuntError, primitives::PROGRESS_KEY};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "waymark.toml";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// FILE LAYER
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HuntSection {
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeofenceSection {
    pub threshold_m: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HintsSection {
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    pub backend: Option<Backend>,
    pub path: Option<PathBuf>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Contents of a `waymark.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaymarkConfig {
    pub hunt: HuntSection,
    pub geofence: GeofenceSection,
    pub hints: HintsSection,
    pub storage: StorageSection,
    pub server: ServerSection,
}

impl WaymarkConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, HuntError> {
        toml::from_str(text).map_err(|e| HuntError::Serialization(format!("Invalid config: {}", e)))
    }

    /// Load the config file.
    ///
    /// An explicit path must exist. Without one, `waymark.toml` in the working
    /// directory is used if present, and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, HuntError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let metadata = std::fs::metadata(&path).map_err(|e| {
            HuntError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(HuntError::Serialization(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            HuntError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        tracing::info!("Using config {}", path.display());
        Self::from_toml(&text)
    }

    /// Merge CLI overrides over this file and the defaults.
    #[must_use]
    pub fn resolve(self, overrides: Overrides) -> Settings {
        let defaults = EngineConfig::default();
        Settings {
            catalog: overrides
                .catalog
                .or(self.hunt.catalog)
                .unwrap_or_else(|| PathBuf::from("hunt.json")),
            backend: overrides
                .backend
                .or(self.storage.backend)
                .unwrap_or_default(),
            database: overrides
                .database
                .or(self.storage.path)
                .unwrap_or_else(|| PathBuf::from("waymark.redb")),
            progress_key: self
                .storage
                .key
                .unwrap_or_else(|| PROGRESS_KEY.to_string()),
            engine: EngineConfig {
                arrival_threshold_m: overrides
                    .threshold_m
                    .or(self.geofence.threshold_m)
                    .unwrap_or(defaults.arrival_threshold_m),
                hint_seed: overrides.seed.or(self.hints.seed),
            },
            host: overrides
                .host
                .or(self.server.host)
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port: overrides.port.or(self.server.port).unwrap_or(8080),
        }
    }
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Where progress is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// redb database file (durable).
    #[default]
    Redb,
    /// Process memory (lost on exit).
    Memory,
}

impl FromStr for Backend {
    type Err = HuntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "memory" => Ok(Self::Memory),
            other => Err(HuntError::Serialization(format!(
                "Unknown backend '{}' (expected redb or memory)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redb => write!(f, "redb"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub catalog: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub database: Option<PathBuf>,
    pub threshold_m: Option<f64>,
    pub seed: Option<u64>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub catalog: PathBuf,
    pub backend: Backend,
    pub database: PathBuf,
    pub progress_key: String,
    pub engine: EngineConfig,
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        WaymarkConfig::default().resolve(Overrides::default())
    }
}
