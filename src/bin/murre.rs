// src/bin/murre.rs

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use murre::cli::{Cli, Commands};
use murre::commands::check::check_file;
use murre::commands::transform::transform_file;
use murre_memo::MemoOptions;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.trace);

    match cli.command {
        Commands::Transform {
            file,
            context_import,
            stable_ids,
            keep_transformed,
            debug_log,
            track_content_params,
        } => {
            let options = MemoOptions {
                context_import,
                stable_for_tests: stable_ids,
                keep_transformed,
                debug_log,
                track_content_params,
            };
            transform_file(&file, &options)
        }
        Commands::Check { file } => check_file(&file),
    }
}

/// Initialize tracing from MURRE_LOG; `--trace` forces debug level for the
/// plugin crates when the variable is unset.
fn init_tracing(trace: bool) {
    let filter = match EnvFilter::try_from_env("MURRE_LOG") {
        Ok(filter) => filter,
        Err(_) if trace => EnvFilter::new("murre=debug,murre_memo=debug"),
        Err(_) => return,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("tracing initialized");
}
