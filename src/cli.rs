//! Command-line interface for querydump.

use std::path::PathBuf;

use clap::Parser;

/// Run the SQL script named in the configuration file and write its result set as JSON.
///
/// Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).
#[derive(Debug, Parser)]
#[command(version, about)]
pub(crate) struct Args {
    /// The configuration file describing the run.
    #[arg(short, long, default_value = "config.toml")]
    pub(crate) config: PathBuf,
}
