// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 10;
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "dirwatch";

/// Configuration as read from a TOML file.
///
/// ```toml
/// [watcher]
/// poll_timeout_ms = 10
/// thread_name_prefix = "dirwatch"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watcher: WatcherSection,
}

/// `[watcher]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherSection {
    /// How long one poll of the watch service may block, in milliseconds.
    ///
    /// Upper bound on how long `stop()` takes to be noticed by the loop.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Loop threads are named `<prefix>-<n>`.
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
}

fn default_poll_timeout_ms() -> u64 {
    DEFAULT_POLL_TIMEOUT_MS
}

fn default_thread_name_prefix() -> String {
    DEFAULT_THREAD_NAME_PREFIX.to_string()
}

impl Default for WatcherSection {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout_ms(),
            thread_name_prefix: default_thread_name_prefix(),
        }
    }
}

/// Validated watcher settings.
///
/// Build one from TOML with [`crate::config::load_and_validate`], or start
/// from `WatcherConfig::default()` and adjust it in code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    pub poll_timeout: Duration,
    pub thread_name_prefix: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl WatcherConfig {
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}

impl From<WatcherSection> for WatcherConfig {
    fn from(section: WatcherSection) -> Self {
        Self {
            poll_timeout: Duration::from_millis(section.poll_timeout_ms),
            thread_name_prefix: section.thread_name_prefix,
        }
    }
}
