// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirWatchError {
    #[error("cannot resolve directory {path:?}: {reason}")]
    PathResolution { path: PathBuf, reason: String },

    #[error("not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("watcher has been stopped")]
    WatcherStopped,

    #[error("watch service cannot watch {path:?}: {reason}")]
    Service { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DirWatchError>;
