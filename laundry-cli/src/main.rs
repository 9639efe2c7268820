//! Binary crate for the `laundry` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = cli::Cli::parse();
    init_logging(cmd.verbose);

    match cmd.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            eprintln!("{}", cli::REMEDIATION_HINT);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout only carries the forecast and recommendation.
/// `RUST_LOG` takes precedence over `-v`, and may come from the `.env` file.
fn init_logging(verbose: u8) {
    // Before the filter is built, so `.env` can set `RUST_LOG`.
    let dotenv = dotenvy::dotenv();

    let directive = filter_directive(verbose, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(directive))
        .init();

    match dotenv {
        Ok(path) => debug!("Read dotenv file from: {}", path.display()),
        Err(err) if err.not_found() => debug!("Couldn't find a dotenv file"),
        Err(err) => warn!("Failed to read .env file: {err}"),
    }
}

fn filter_directive(verbose: u8, rust_log: Option<String>) -> String {
    if let Some(directive) = rust_log.filter(|d| !d.trim().is_empty()) {
        return directive;
    }

    match verbose {
        0 => "warn",
        1 => "info,laundry_core=info",
        2 => "debug",
        _ => "trace",
    }
    .to_string()
}
