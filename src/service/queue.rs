// src/service/queue.rs

//! Key bookkeeping shared by watch service implementations.
//!
//! [`KeyTable`] is a pure data structure: one entry per watched directory
//! holding its reported kinds, its pending events and its signal state, plus
//! a FIFO of signalled keys. [`SharedKeyTable`] wraps it in a mutex and a
//! condition variable so a producer thread (the OS backend) can signal keys
//! while the watch loop blocks in [`SharedKeyTable::poll`].
//!
//! Key states:
//! - `Armed`: no pending events; the next event signals the key.
//! - `Signalled`: queued in (or just popped from) the ready FIFO; further
//!   events accumulate without queueing the key twice.
//! - `Invalid`: the directory is gone. The key is queued once so the loop
//!   notices, and `rearm` then reports `false` and forgets it.

use std::collections::{HashMap, VecDeque};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::WatchKey;
use crate::types::{EventKind, KindSet, WatchEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Armed,
    Signalled,
    Invalid,
}

#[derive(Debug)]
struct KeyEntry {
    dir: PathBuf,
    kinds: KindSet,
    pending: Vec<WatchEvent>,
    state: KeyState,
}

#[derive(Debug, Default)]
pub struct KeyTable {
    next_id: u64,
    by_dir: HashMap<PathBuf, WatchKey>,
    keys: HashMap<WatchKey, KeyEntry>,
    ready: VecDeque<WatchKey>,
    closed: bool,
}

impl KeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dir` for `kinds`.
    ///
    /// Returns the key and whether it was newly created. Registering a
    /// directory that already has a valid key returns that key and replaces
    /// its kinds.
    pub fn register(&mut self, dir: &Path, kinds: KindSet) -> (WatchKey, bool) {
        if let Some(&key) = self.by_dir.get(dir) {
            if let Some(entry) = self.keys.get_mut(&key) {
                debug!(?dir, ?kinds, key = key.id(), "re-registration replaces key kinds");
                entry.kinds = kinds;
                return (key, false);
            }
        }

        let key = WatchKey::new(self.next_id);
        self.next_id += 1;
        self.by_dir.insert(dir.to_path_buf(), key);
        self.keys.insert(
            key,
            KeyEntry {
                dir: dir.to_path_buf(),
                kinds,
                pending: Vec::new(),
                state: KeyState::Armed,
            },
        );
        (key, true)
    }

    /// Drop a key entirely (used when the backend refused to arm it).
    pub fn forget(&mut self, key: WatchKey) {
        if let Some(entry) = self.keys.remove(&key) {
            if self.by_dir.get(&entry.dir) == Some(&key) {
                self.by_dir.remove(&entry.dir);
            }
        }
        self.ready.retain(|k| *k != key);
    }

    pub fn key_for(&self, dir: &Path) -> Option<WatchKey> {
        self.by_dir.get(dir).copied()
    }

    pub fn dir_of(&self, key: WatchKey) -> Option<&Path> {
        self.keys.get(&key).map(|e| e.dir.as_path())
    }

    pub fn kinds_of(&self, dir: &Path) -> Option<KindSet> {
        let key = self.by_dir.get(dir)?;
        self.keys.get(key).map(|e| e.kinds)
    }

    pub fn state_of(&self, key: WatchKey) -> Option<KeyState> {
        self.keys.get(&key).map(|e| e.state)
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.by_dir.contains_key(dir)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Queue `event` for the key watching `dir`.
    ///
    /// Events whose kind the key was not registered for are dropped, except
    /// `Overflow`, which is always reported. Returns `true` if the key became
    /// signalled by this call.
    pub fn push(&mut self, dir: &Path, event: WatchEvent) -> bool {
        if self.closed {
            return false;
        }
        let Some(&key) = self.by_dir.get(dir) else {
            trace!(?dir, "event for unwatched directory dropped");
            return false;
        };
        let Some(entry) = self.keys.get_mut(&key) else {
            return false;
        };
        if entry.state == KeyState::Invalid {
            return false;
        }
        if event.kind != EventKind::Overflow && !entry.kinds.contains(event.kind) {
            trace!(?dir, kind = %event.kind, "event kind not registered on key; dropped");
            return false;
        }

        entry.pending.push(event);
        if entry.state == KeyState::Armed {
            entry.state = KeyState::Signalled;
            self.ready.push_back(key);
            true
        } else {
            false
        }
    }

    /// Queue an overflow event on every valid key.
    pub fn push_overflow_all(&mut self) -> bool {
        let dirs: Vec<PathBuf> = self.by_dir.keys().cloned().collect();
        let mut signalled = false;
        for dir in dirs {
            signalled |= self.push(&dir, WatchEvent::overflow());
        }
        signalled
    }

    /// Mark the key for `dir` permanently invalid.
    ///
    /// The directory mapping is dropped immediately, so a later `register`
    /// for the same path creates a fresh key. Returns `true` if the key had
    /// to be queued so the loop observes the invalidation.
    pub fn invalidate(&mut self, dir: &Path) -> bool {
        let Some(key) = self.by_dir.remove(dir) else {
            return false;
        };
        let Some(entry) = self.keys.get_mut(&key) else {
            return false;
        };
        let was_armed = entry.state == KeyState::Armed;
        entry.state = KeyState::Invalid;
        debug!(?dir, key = key.id(), "key invalidated");
        if was_armed {
            self.ready.push_back(key);
        }
        was_armed
    }

    pub fn pop_ready(&mut self) -> Option<WatchKey> {
        self.ready.pop_front()
    }

    pub fn drain(&mut self, key: WatchKey) -> Vec<WatchEvent> {
        self.keys
            .get_mut(&key)
            .map(|e| mem::take(&mut e.pending))
            .unwrap_or_default()
    }

    /// Re-arm a key after its events were drained.
    ///
    /// A key with events that arrived during dispatch is queued again right
    /// away. Invalid or unknown keys return `false`; invalid keys are
    /// forgotten here.
    pub fn rearm(&mut self, key: WatchKey) -> bool {
        let state = match self.keys.get(&key) {
            Some(entry) => entry.state,
            None => return false,
        };

        match state {
            KeyState::Invalid => {
                self.keys.remove(&key);
                false
            }
            KeyState::Armed => true,
            KeyState::Signalled => {
                let has_pending = self
                    .keys
                    .get(&key)
                    .is_some_and(|e| !e.pending.is_empty());
                if has_pending {
                    self.ready.push_back(key);
                } else if let Some(entry) = self.keys.get_mut(&key) {
                    entry.state = KeyState::Armed;
                }
                true
            }
        }
    }

    /// Forget every key. Later pushes are ignored.
    pub fn close(&mut self) {
        self.closed = true;
        self.by_dir.clear();
        self.keys.clear();
        self.ready.clear();
    }
}

/// [`KeyTable`] behind a mutex, with a condition variable for `poll`.
#[derive(Debug, Default)]
pub struct SharedKeyTable {
    table: Mutex<KeyTable>,
    ready: Condvar,
}

impl SharedKeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, KeyTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a mutation that reports whether a key became ready, waking the
    /// poller if so.
    pub fn update(&self, f: impl FnOnce(&mut KeyTable) -> bool) -> bool {
        let signalled = {
            let mut table = self.lock();
            f(&mut table)
        };
        if signalled {
            self.ready.notify_all();
        }
        signalled
    }

    /// Wait up to `timeout` for a signalled key.
    pub fn poll(&self, timeout: Duration) -> Option<WatchKey> {
        let deadline = Instant::now() + timeout;
        let mut table = self.lock();
        loop {
            if let Some(key) = table.pop_ready() {
                return Some(key);
            }
            if table.is_closed() {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            table = match self.ready.wait_timeout(table, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    pub fn close(&self) {
        self.lock().close();
        self.ready.notify_all();
    }
}
