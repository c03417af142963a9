// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawConfigFile, WatcherConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** check value
/// ranges. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Parse and validate configuration held in memory.
pub fn load_from_str(contents: &str) -> Result<WatcherConfig> {
    let raw: RawConfigFile = toml::from_str(contents)?;
    WatcherConfig::try_from(raw)
}

/// Load a configuration file from path and validate it.
///
/// Missing keys take their defaults (handled by `serde` + `Default` impls).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WatcherConfig> {
    let raw_config = load_from_path(&path)?;
    WatcherConfig::try_from(raw_config)
}
