// src/service/mock.rs

//! In-memory [`WatchService`] for deterministic tests.
//!
//! Nothing touches the OS: tests call [`MockWatchService::fire`] to queue an
//! event on the key watching a directory, exactly as a backend thread would.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::queue::SharedKeyTable;
use super::{WatchKey, WatchService};
use crate::errors::{DirWatchError, Result};
use crate::types::{EventKind, KindSet, WatchEvent};

#[derive(Debug, Default)]
pub struct MockWatchService {
    table: SharedKeyTable,
    registrations: Mutex<Vec<(PathBuf, KindSet)>>,
    refused: Mutex<HashSet<PathBuf>>,
    close_calls: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockWatchService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the key watching `dir` (dropped if unwatched).
    pub fn fire(&self, dir: impl AsRef<Path>, relative: impl Into<PathBuf>, kind: EventKind) {
        let event = WatchEvent::new(relative, kind);
        self.table.update(|t| t.push(dir.as_ref(), event));
    }

    /// Queue an overflow event on every key.
    pub fn overflow(&self) {
        self.table.update(|t| t.push_overflow_all());
    }

    /// Simulate removal of a watched directory.
    pub fn invalidate(&self, dir: impl AsRef<Path>) {
        self.table.update(|t| t.invalidate(dir.as_ref()));
    }

    /// Make later registrations of `dir` fail.
    pub fn refuse(&self, dir: impl AsRef<Path>) {
        lock(&self.refused).insert(dir.as_ref().to_path_buf());
    }

    /// Every `register` call seen, in order.
    pub fn registrations(&self) -> Vec<(PathBuf, KindSet)> {
        lock(&self.registrations).clone()
    }

    pub fn kinds_of(&self, dir: impl AsRef<Path>) -> Option<KindSet> {
        self.table.lock().kinds_of(dir.as_ref())
    }

    pub fn is_watched(&self, dir: impl AsRef<Path>) -> bool {
        self.table.lock().is_watched(dir.as_ref())
    }

    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl WatchService for MockWatchService {
    fn register(&self, dir: &Path, kinds: KindSet) -> Result<WatchKey> {
        if lock(&self.refused).contains(dir) {
            return Err(DirWatchError::Service {
                path: dir.to_path_buf(),
                reason: "registration refused".to_string(),
            });
        }
        lock(&self.registrations).push((dir.to_path_buf(), kinds));
        let (key, _created) = self.table.lock().register(dir, kinds);
        Ok(key)
    }

    fn poll(&self, timeout: Duration) -> Option<WatchKey> {
        self.table.poll(timeout)
    }

    fn drain_events(&self, key: WatchKey) -> Vec<WatchEvent> {
        self.table.lock().drain(key)
    }

    fn rearm(&self, key: WatchKey) -> bool {
        // Only the polling thread rearms, so a requeued key needs no wakeup.
        self.table.lock().rearm(key)
    }

    fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.table.close();
        Ok(())
    }
}
