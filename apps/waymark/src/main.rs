//! # Waymark - Scavenger Hunt Server
//!
//! The main binary for the Waymark stage progression engine.
//!
//! This application provides:
//! - HTTP API a map front end drives (axum-based)
//! - CLI for checking catalogs, replaying walks and managing progress
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              apps/waymark (THE BINARY)           │
//! │                                                  │
//! │   ┌─────────────┐          ┌─────────────┐       │
//! │   │    CLI      │          │  HTTP API   │       │
//! │   │   (clap)    │          │   (axum)    │       │
//! │   └──────┬──────┘          └──────┬──────┘       │
//! │          └────────────┬───────────┘              │
//! │                       ▼                          │
//! │              ┌────────────────┐                  │
//! │              │  waymark-core  │                  │
//! │              │  (THE ENGINE)  │                  │
//! │              └────────────────┘                  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! waymark -C hunts/easter.json serve --port 8080
//!
//! # CLI operations
//! waymark -C hunts/easter.json validate
//! waymark -C hunts/easter.json walk -f hunts/walk.json
//! waymark reset
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // WAYMARK_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("WAYMARK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "waymark=debug,waymark_core=debug,tower_http=debug"
    } else {
        "waymark=info,waymark_core=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Waymark startup banner.
fn print_banner() {
    println!(
        r#"
  ╦ ╦╔═╗╦ ╦╔╦╗╔═╗╦═╗╦╔═
  ║║║╠═╣╚╦╝║║║╠═╣╠╦╝╠╩╗
  ╚╩╝╩ ╩ ╩ ╩ ╩╩ ╩╩╚═╩ ╩

  Scavenger Hunt Engine v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
