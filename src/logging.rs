//! Logging initialization via `tracing-subscriber`.
//!
//! Logs go to stderr so CSV and Markdown reports on stdout stay clean.
//! The default level is `info`, which keeps the fetch progress messages
//! the batch scripts rely on; `-v`/`-vv` raise to debug/trace and `-q`
//! drops to errors only. An explicit `RUST_LOG` always wins.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber for the CLI.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
    Ok(())
}

/// Initialize logging for tests. Safe to call repeatedly.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tracker_metrics=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
