// src/service/mod.rs

//! The watch primitive driven by the watch loop.
//!
//! A [`WatchService`] hands out one [`WatchKey`] per watched directory and
//! behaves like a classic keyed watch service:
//!
//! - a key becomes *signalled* when events are queued for it and is returned
//!   once by [`WatchService::poll`];
//! - its events are taken with [`WatchService::drain_events`];
//! - [`WatchService::rearm`] makes it eligible for signalling again, or
//!   reports `false` once the key is permanently invalid (directory removed).
//!
//! Registering the same directory twice returns the same key and replaces
//! the kinds it reports. The watcher works around that by always arming keys
//! for every kind.
//!
//! - [`queue`] holds the key bookkeeping shared by all implementations.
//! - [`notify_service`] is the production backend on top of `notify`.
//! - [`mock`] is an in-memory backend where tests inject events directly.

use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use crate::errors::Result;
use crate::types::{KindSet, WatchEvent};

pub mod mock;
pub mod notify_service;
pub mod queue;

pub use mock::MockWatchService;
pub use notify_service::NotifyWatchService;
pub use queue::{KeyTable, SharedKeyTable};

/// Opaque token for one armed watch on one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchKey(u64);

impl WatchKey {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Keyed directory watch primitive.
pub trait WatchService: Send + Sync + Debug {
    /// Arm a watch on `dir` for `kinds`, returning its key.
    fn register(&self, dir: &Path, kinds: KindSet) -> Result<WatchKey>;

    /// Wait up to `timeout` for the next signalled key.
    fn poll(&self, timeout: Duration) -> Option<WatchKey>;

    /// Take all events queued for `key`.
    fn drain_events(&self, key: WatchKey) -> Vec<WatchEvent>;

    /// Re-arm a signalled key. Returns `false` if the key is no longer valid.
    fn rearm(&self, key: WatchKey) -> bool;

    /// Release all resources. Later polls return `None`.
    fn close(&self) -> Result<()>;
}
