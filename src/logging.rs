//! Logging initialization for mediabroker.
//!
//! The broker runs headless behind a frontend, so the default setup tees
//! every event to stdout (for the process supervisor) and to the log file
//! named in the config.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Build the level filter, letting `RUST_LOG` refine the configured level.
fn build_filter(level: &str) -> EnvFilter {
    let directive = level
        .parse()
        .unwrap_or_else(|_| tracing::Level::INFO.into());
    EnvFilter::from_default_env().add_directive(directive)
}

/// Initialize logging to stdout and the configured log file.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if let Some(parent) = Path::new(&config.file).parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = Arc::new(File::create(&config.file)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(build_filter(&config.level))
        .init();

    Ok(())
}

/// Initialize console-only logging, the fallback when the log file cannot
/// be created.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_target(true),
        )
        .with(build_filter(level))
        .init();
}
