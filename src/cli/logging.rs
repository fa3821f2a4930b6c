//! Logging initialization

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Initialize logging
///
/// Without `debug`, warnings go to stderr filtered by `RUST_LOG` or the
/// configured `level`. With `debug`, everything down to `debug` goes to a
/// temporary log file whose path is returned, keeping stdout clean for
/// command output.
pub fn init_logging(debug: bool, level: &str) -> Result<Option<PathBuf>> {
    if !debug {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
            )
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
        return Ok(None);
    }

    let temp_file = tempfile::Builder::new()
        .prefix("fluxgraph-")
        .suffix(".log")
        .tempfile()
        .context("Failed to create log file")?;
    // Keep the file once the process exits so it can be inspected
    let (file, path) = temp_file
        .keep()
        .context("Failed to persist log file")?;

    tracing_subscriber::fmt()
        .with_writer(file)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(Some(path))
}
