//! # Lineal CLI Module
//!
//! This module implements the CLI interface for Lineal.
//!
//! ## Available Commands
//!
//! - `enrich` - Run the enrichment pipeline over a person record file
//! - `issues` - Export issues from a stored run snapshot
//! - `check-config` - Validate a configuration file

mod commands;

use clap::{Parser, Subcommand};
use lineal_core::LinealError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Lineal - Genealogical Enrichment Engine
///
/// A deterministic, rule-based engine that derives missing facts from
/// genealogical records and flags data-quality problems. Source records
/// are never modified; everything derived lands in overlays.
#[derive(Parser, Debug)]
#[command(name = "lineal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the enrichment pipeline over a person record file
    Enrich {
        /// Path to the input file (JSON array of person records)
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the configuration file (TOML); defaults apply if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the issue CSV to this path (stdout if omitted)
        #[arg(long)]
        issues: Option<PathBuf>,

        /// Write a binary run snapshot to this path
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Export issues from a stored run snapshot
    Issues {
        /// Path to the snapshot file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Write the issue CSV to this path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration file without running anything
    CheckConfig {
        /// Path to the configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Default tracing directive for the chosen verbosity.
///
/// `RUST_LOG` still wins when set; this is only the fallback.
#[must_use]
pub fn log_directive(verbose: bool) -> &'static str {
    if verbose { "lineal=debug" } else { "lineal=info" }
}

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), LinealError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Enrich {
            input,
            config,
            issues,
            snapshot,
        } => cmd_enrich(
            &input,
            config.as_deref(),
            issues.as_deref(),
            snapshot.as_deref(),
            json_mode,
        ),
        Commands::Issues { snapshot, output } => cmd_issues(&snapshot, output.as_deref()),
        Commands::CheckConfig { config } => cmd_check_config(&config, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
