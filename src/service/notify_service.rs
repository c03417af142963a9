// src/service/notify_service.rs

//! Production [`WatchService`] on top of the `notify` crate.
//!
//! Each registered directory gets its own non-recursive `notify` watch. The
//! `notify` callback runs on the backend's thread; it translates every raw
//! event into per-directory [`WatchEvent`]s (see [`translate`]) and queues
//! them on the key table, waking the watch loop.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

use super::queue::{KeyTable, SharedKeyTable};
use super::{WatchKey, WatchService};
use crate::errors::{DirWatchError, Result};
use crate::types::{EventKind, KindSet, WatchEvent};

/// What a single raw `notify` event means for the key table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Queue `event` on the key watching `dir`.
    Deliver { dir: PathBuf, event: WatchEvent },
    /// `path` was removed. A watched directory loses its key; any other path
    /// is reported as a delete in its parent.
    Removed(PathBuf),
    /// The backend dropped events; every key gets an overflow.
    OverflowAll,
}

/// Translate a raw `notify` event into key table operations.
///
/// Event paths are absolute; each one is split into its parent directory
/// (the candidate watched directory) and its file name (the relative path).
pub fn translate(event: &Event) -> Vec<Routed> {
    let mut out = Vec::new();
    if event.need_rescan() {
        out.push(Routed::OverflowAll);
    }

    match &event.kind {
        notify::EventKind::Create(_) => {
            deliver_all(&event.paths, EventKind::Create, &mut out);
        }
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            deliver_all(&event.paths, EventKind::Delete, &mut out);
        }
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            deliver_all(&event.paths, EventKind::Create, &mut out);
        }
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if let [from, to] = event.paths.as_slice() {
                deliver(from, EventKind::Delete, &mut out);
                deliver(to, EventKind::Create, &mut out);
            }
        }
        notify::EventKind::Modify(ModifyKind::Name(_)) => {
            // Backends that cannot tell the rename direction report one path.
            for path in &event.paths {
                let kind = if path.exists() {
                    EventKind::Create
                } else {
                    EventKind::Delete
                };
                deliver(path, kind, &mut out);
            }
        }
        notify::EventKind::Modify(_) => {
            deliver_all(&event.paths, EventKind::Modify, &mut out);
        }
        notify::EventKind::Remove(_) => {
            out.extend(event.paths.iter().cloned().map(Routed::Removed));
        }
        notify::EventKind::Access(_) | notify::EventKind::Any | notify::EventKind::Other => {}
    }

    out
}

fn deliver_all(paths: &[PathBuf], kind: EventKind, out: &mut Vec<Routed>) {
    for path in paths {
        deliver(path, kind, out);
    }
}

fn deliver(path: &Path, kind: EventKind, out: &mut Vec<Routed>) {
    if let Some((dir, event)) = split(path, kind) {
        out.push(Routed::Deliver { dir, event });
    }
}

fn split(path: &Path, kind: EventKind) -> Option<(PathBuf, WatchEvent)> {
    let dir = path.parent()?;
    let name = path.file_name()?;
    Some((dir.to_path_buf(), WatchEvent::new(name, kind)))
}

/// Apply one routed operation to the key table. Returns `true` if a key
/// became ready.
///
/// The backend reports a watched directory's removal twice: once on its own
/// watch and once on its parent's. Whichever arrives first kills the key;
/// only the other one is delivered to the parent, so the parent sees a
/// single delete.
pub fn apply(table: &mut KeyTable, routed: Routed) -> bool {
    match routed {
        Routed::Deliver { dir, event } => table.push(&dir, event),
        Routed::Removed(path) if table.is_watched(&path) => table.invalidate(&path),
        Routed::Removed(path) => match split(&path, EventKind::Delete) {
            Some((dir, event)) => table.push(&dir, event),
            None => false,
        },
        Routed::OverflowAll => table.push_overflow_all(),
    }
}

fn route_event(table: &SharedKeyTable, event: Event) {
    trace!(?event, "received notify event");
    for routed in translate(&event) {
        table.update(move |t| apply(t, routed));
    }
}

/// [`WatchService`] backed by `notify::RecommendedWatcher`.
pub struct NotifyWatchService {
    table: Arc<SharedKeyTable>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl fmt::Debug for NotifyWatchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyWatchService")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl NotifyWatchService {
    pub fn new() -> Result<Self> {
        let table = Arc::new(SharedKeyTable::new());

        // Called synchronously by notify on its backend thread.
        let watcher = RecommendedWatcher::new(
            {
                let table = Arc::clone(&table);
                move |res: notify::Result<Event>| match res {
                    Ok(event) => route_event(&table, event),
                    Err(err) => warn!(error = %err, paths = ?err.paths, "file watch error"),
                }
            },
            Config::default(),
        )?;

        Ok(Self {
            table,
            watcher: Mutex::new(Some(watcher)),
        })
    }

    fn watcher(&self) -> MutexGuard<'_, Option<RecommendedWatcher>> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WatchService for NotifyWatchService {
    fn register(&self, dir: &Path, kinds: KindSet) -> Result<WatchKey> {
        let (key, created) = self.table.lock().register(dir, kinds);
        if !created {
            return Ok(key);
        }

        // The table lock must not be held here: `watch` round-trips through
        // the backend thread, which may be waiting on the table in a callback.
        let armed = match self.watcher().as_mut() {
            Some(watcher) => watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|err| err.to_string()),
            None => Err("watch service is closed".to_string()),
        };

        match armed {
            Ok(()) => {
                debug!(?dir, key = key.id(), "armed notify watch");
                Ok(key)
            }
            Err(reason) => {
                self.table.lock().forget(key);
                Err(DirWatchError::Service {
                    path: dir.to_path_buf(),
                    reason,
                })
            }
        }
    }

    fn poll(&self, timeout: Duration) -> Option<WatchKey> {
        self.table.poll(timeout)
    }

    fn drain_events(&self, key: WatchKey) -> Vec<WatchEvent> {
        self.table.lock().drain(key)
    }

    fn rearm(&self, key: WatchKey) -> bool {
        let (valid, orphan) = {
            let mut table = self.table.lock();
            let dir = table.dir_of(key).map(Path::to_path_buf);
            let valid = table.rearm(key);
            // Only drop the OS watch if nobody re-registered the path meanwhile.
            let orphan = dir.filter(|d| !valid && !table.is_watched(d));
            (valid, orphan)
        };

        if let Some(dir) = orphan {
            if let Some(watcher) = self.watcher().as_mut() {
                if let Err(err) = watcher.unwatch(&dir) {
                    debug!(?dir, error = %err, "unwatch of invalidated directory failed");
                }
            }
        }
        valid
    }

    fn close(&self) -> Result<()> {
        self.table.close();
        // Dropping the watcher shuts down the backend thread.
        let watcher = self.watcher().take();
        drop(watcher);
        Ok(())
    }
}
