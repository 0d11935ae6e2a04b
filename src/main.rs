//! Vital Health Vision - inspect source routing and the offline data cache
//!
//! A command-line front end over the category router and the offline cache
//! that the dashboard uses when live health-data sources are unavailable.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vitalvision::cache::{FileStorage, OfflineCache};
use vitalvision::cli::{self, Cli, CliError};

/// Initialize the tracing subscriber for logging
///
/// Use the RUST_LOG env var to control the level (e.g., RUST_LOG=debug).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let settings = cli.settings()?;

    let storage = match &settings.data_dir {
        Some(dir) => FileStorage::with_dir(dir.clone()),
        None => FileStorage::new().ok_or(CliError::NoDataDir)?,
    };
    debug!(dir = %storage.dir().display(), key = %settings.storage_key, "Opening offline cache");

    let cache = OfflineCache::new(storage, settings.cache_config()?);
    let stdout = io::stdout();
    cli::run(&cli.command, &cache, &mut stdout.lock())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
