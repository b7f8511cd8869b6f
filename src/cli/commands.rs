//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - plan: render the plan for a manifest
//! - check: report diagnostics for a manifest
//! - queue: list enqueued modules with their effective attributes
//! - inspect: show the graph neighborhood of one module

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// modsched - plan module load tags, preloads and the import map
#[derive(Parser, Debug)]
#[command(name = "modsched")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the emission plan for a manifest
    Plan {
        /// Manifest file (YAML)
        manifest: PathBuf,

        /// Output format (html, json); defaults to the configured format
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Report diagnostics; exits non-zero if any are found
    Check {
        /// Manifest file (YAML)
        manifest: PathBuf,
    },

    /// List enqueued modules with effective priority and placement
    Queue {
        /// Manifest file (YAML)
        manifest: PathBuf,
    },

    /// Show dependencies, dependents and effective attributes of a module
    Inspect {
        /// Manifest file (YAML)
        manifest: PathBuf,

        /// Module id
        id: String,
    },
}

impl Commands {
    /// Manifest path shared by every subcommand
    pub fn manifest(&self) -> &PathBuf {
        match self {
            Commands::Plan { manifest, .. }
            | Commands::Check { manifest }
            | Commands::Queue { manifest }
            | Commands::Inspect { manifest, .. } => manifest,
        }
    }
}
