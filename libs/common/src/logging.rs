//! Unified logging module for MachinePulse services
//!
//! Thin wrapper over tracing-subscriber: level comes from config, the
//! `RUST_LOG` environment variable wins when set.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `default_level` is the configured log level (e.g. "info", "debug",
/// "statsrv=debug,warn"). `RUST_LOG` overrides it when present.
///
/// Calling this twice returns an error, so tests that each build their own
/// subscriber should use [`try_init_for_tests`] instead.
pub fn init(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("Invalid log filter: {}", default_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Best-effort subscriber init for tests; ignores "already initialized".
pub fn try_init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
