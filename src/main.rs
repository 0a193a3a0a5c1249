//! A command-line interface that exports the result of one SQL query to a JSON file.
//!
//! For usage, run `cargo run --features binary -- --help`.

#[cfg(not(any(feature = "duckdb", feature = "sqlite",)))]
compile_error!("at least one backend must be enabled (options are `duckdb` and `sqlite`)");

mod cli;

use std::io;
use std::process::ExitCode;

use clap::Parser as _;
use querydump::{export, Config, Outcome};
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let Args { config } = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::from_path(config)
        .inspect_err(|err| tracing::error!(error = %err, "unable to load the configuration"))?;
    match export(&config)? {
        Outcome::Written(path) => {
            tracing::info!(path = %path.display(), "result written");
            Ok(ExitCode::SUCCESS)
        }
        // Already reported; there is nothing to show beyond a failing status.
        Outcome::Skipped => Ok(ExitCode::FAILURE),
    }
}
