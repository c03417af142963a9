// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{RawConfigFile, WatcherConfig};
use crate::errors::{DirWatchError, Result};

const MIN_POLL_TIMEOUT: Duration = Duration::from_millis(1);
const MAX_POLL_TIMEOUT: Duration = Duration::from_millis(1000);

impl TryFrom<RawConfigFile> for WatcherConfig {
    type Error = DirWatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let config = WatcherConfig::from(raw.watcher);
        validate_config(&config)?;
        Ok(config)
    }
}

/// Check that a config is usable by a watcher.
pub fn validate_config(cfg: &WatcherConfig) -> Result<()> {
    validate_poll_timeout(cfg.poll_timeout)?;
    validate_thread_name_prefix(&cfg.thread_name_prefix)?;
    Ok(())
}

fn validate_poll_timeout(timeout: Duration) -> Result<()> {
    if timeout < MIN_POLL_TIMEOUT || timeout > MAX_POLL_TIMEOUT {
        return Err(DirWatchError::Config(format!(
            "[watcher].poll_timeout_ms must be between {} and {} (got {})",
            MIN_POLL_TIMEOUT.as_millis(),
            MAX_POLL_TIMEOUT.as_millis(),
            timeout.as_millis()
        )));
    }
    Ok(())
}

fn validate_thread_name_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(DirWatchError::Config(
            "[watcher].thread_name_prefix must not be empty".to_string(),
        ));
    }
    // std::thread::Builder panics on names containing NUL.
    if prefix.contains('\0') {
        return Err(DirWatchError::Config(
            "[watcher].thread_name_prefix must not contain NUL bytes".to_string(),
        ));
    }
    Ok(())
}
