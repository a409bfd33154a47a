// src/cli/args.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use murre_memo::DEFAULT_CONTEXT_IMPORT;

/// Memoization compiler plugin for declarative UI units
#[derive(Parser)]
#[command(name = "murre")]
#[command(version = "0.1.0")]
#[command(about = "Memoization rewrite for .uis units", long_about = None)]
pub struct Cli {
    /// Log plugin stages to stderr (MURRE_LOG overrides the level)
    #[arg(long, global = true)]
    pub trace: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite a unit and print the transformed source
    Transform {
        /// Path to the .uis file to rewrite
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Module specifier for the injected runtime-type import
        #[arg(long, value_name = "MODULE", default_value = DEFAULT_CONTEXT_IMPORT)]
        context_import: String,
        /// Deterministic string positional ids instead of hashed ones
        #[arg(long)]
        stable_ids: bool,
        /// Dump the rewritten unit into DIR as <stem>.memo.uis
        #[arg(long, value_name = "DIR")]
        keep_transformed: Option<PathBuf>,
        /// Insert console.log probes for cache-state changes
        #[arg(long)]
        debug_log: bool,
        /// Track trailing content parameters like any other parameter
        #[arg(long)]
        track_content_params: bool,
    },
    /// Check memo usage in a unit without rewriting it
    Check {
        /// Path to the .uis file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}
