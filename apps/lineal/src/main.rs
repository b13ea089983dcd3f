//! # Lineal - Genealogical Enrichment Engine
//!
//! The main binary for the Lineal deterministic enrichment engine.
//!
//! This application provides:
//! - CLI interface for enrichment runs
//! - Issue CSV export and binary run snapshots
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              apps/lineal (THE BINARY)            │
//! │                                                  │
//! │   ┌─────────────┐        ┌──────────────────┐    │
//! │   │   CLI       │        │  File I/O        │    │
//! │   │  (clap)     │        │  (json/toml/csv) │    │
//! │   └──────┬──────┘        └────────┬─────────┘    │
//! │          │                        │              │
//! │          └───────────┬────────────┘              │
//! │                      ▼                           │
//! │              ┌───────────────┐                   │
//! │              │  lineal-core  │                   │
//! │              │  (THE LOGIC)  │                   │
//! │              └───────────────┘                   │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Enrich a record set and export the findings
//! lineal enrich -i people.json -c lineal.toml --issues issues.csv
//!
//! # Re-export issues from a stored snapshot
//! lineal issues -s run.lineal -o issues.csv
//!
//! # Validate a configuration file
//! lineal check-config -c lineal.toml
//! ```

use clap::Parser;
use lineal::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments first; verbosity feeds the log filter.
    let cli = cli::Cli::parse();

    // Initialize tracing. LINEAL_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LINEAL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli::log_directive(cli.verbose).into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Lineal startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗     ██╗███╗   ██╗███████╗ █████╗ ██╗
  ██║     ██║████╗  ██║██╔════╝██╔══██╗██║
  ██║     ██║██╔██╗ ██║█████╗  ███████║██║
  ██║     ██║██║╚██╗██║██╔══╝  ██╔══██║██║
  ███████╗██║██║ ╚████║███████╗██║  ██║███████╗
  ╚══════╝╚═╝╚═╝  ╚═══╝╚══════╝╚═╝  ╚═╝╚══════╝

  Genealogical Enrichment Engine v{}

  Deterministic • Monotone • Auditable
"#,
        env!("CARGO_PKG_VERSION")
    );
}
