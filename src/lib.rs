// src/lib.rs

//! Directory change notifications with per-callback filtering.
//!
//! Many callbacks can subscribe to the same directory, each with its own
//! set of event kinds, recursion flag and execution target. They all share
//! one watch handle per canonical directory and a single background loop
//! per [`DirWatcher`].
//!
//! The crate is layered as:
//! - [`service`]: the keyed watch primitive (`notify`-backed, or a mock).
//! - [`watch`]: subscriptions, the registry, the dispatcher and the public
//!   watcher API.
//! - [`engine`]: the watch loop and its lifecycle.
//! - [`exec`]: execution targets for callbacks.
//! - [`config`], [`logging`], [`errors`]: ambient concerns.
//!
//! Events are not coalesced: a burst of OS events yields a burst of
//! callbacks.

pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod service;
pub mod types;
pub mod watch;

pub use config::WatcherConfig;
pub use engine::WatchState;
pub use errors::{DirWatchError, Result};
pub use exec::{CallbackExecutor, SerialExecutor, TokioExecutor};
pub use types::{EventKind, KindSet, WatchEvent};
pub use watch::{Callback, DirWatcher, DirWatcherBuilder};
