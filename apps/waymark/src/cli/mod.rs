//! # Waymark CLI Module
//!
//! ## Available Commands
//!
//! - `validate` - Check a stage catalog file
//! - `status` - Show stored progress against a catalog
//! - `walk` - Replay a script of position fixes and passphrases
//! - `reset` - Erase stored progress
//! - `serve` - Start the HTTP server

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use waymark::config::{Backend, Overrides, WaymarkConfig};
use waymark_core::HuntError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Waymark - location-based scavenger hunt engine
///
/// Walk to each goal, enter its passphrase, unlock the next stage.
#[derive(Parser, Debug)]
#[command(name = "waymark")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a waymark.toml config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the stage catalog (JSON)
    #[arg(short = 'C', long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Path to the progress database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (database file) or "memory" (volatile)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<Backend>,

    /// Arrival radius in meters
    #[arg(long, global = true)]
    pub threshold: Option<f64>,

    /// Seed for wrong-passphrase hint selection
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that a catalog file loads
    Validate,

    /// Show stored progress
    Status,

    /// Replay a walk script against the hunt
    Walk {
        /// Path to the script (JSON array of steps)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Erase stored progress
    Reset,

    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), HuntError> {
    let file = WaymarkConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    let (host, port) = match &cli.command {
        Some(Commands::Serve { host, port }) => (host.clone(), *port),
        _ => (None, None),
    };

    let settings = file.resolve(Overrides {
        catalog: cli.catalog,
        backend: cli.backend,
        database: cli.database,
        threshold_m: cli.threshold,
        seed: cli.seed,
        host,
        port,
    });
    tracing::debug!(?settings, "Resolved settings");

    match cli.command {
        Some(Commands::Validate) => cmd_validate(&settings, json_mode),
        Some(Commands::Status) => cmd_status(&settings, json_mode),
        Some(Commands::Walk { file }) => cmd_walk(&settings, json_mode, &file),
        Some(Commands::Reset) => cmd_reset(&settings, json_mode),
        Some(Commands::Serve { .. }) => cmd_serve(&settings).await,
        None => {
            // No subcommand - show status by default
            cmd_status(&settings, json_mode)
        }
    }
}
