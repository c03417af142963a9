// src/logging.rs

//! Logging setup for `dirwatch` using `tracing` + `tracing-subscriber`.
//!
//! The library itself only emits `tracing` events; applications embedding it
//! may install their own subscriber instead of calling [`init_logging`].
//!
//! Priority for determining the log level:
//! 1. explicit level passed by the caller (if provided)
//! 2. `DIRWATCH_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::fmt;

/// Environment variable consulted when no explicit level is given.
pub const LOG_ENV_VAR: &str = "DIRWATCH_LOG";

/// Initialise a global logging subscriber writing to stderr.
///
/// Fails if a global subscriber has already been installed.
pub fn init_logging(level: Option<Level>) -> Result<()> {
    let level = match level {
        Some(lvl) => lvl,
        None => std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

/// Parse a level name as accepted in `DIRWATCH_LOG`.
pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
