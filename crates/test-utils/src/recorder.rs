use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use dirwatch::{Callback, EventKind};

use crate::wait_until;

/// One callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub dir: PathBuf,
    pub relative: PathBuf,
    pub kind: EventKind,
    pub thread: Option<String>,
}

impl Recorded {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.relative)
    }
}

/// A callback that records every invocation.
///
/// `callback()` always returns clones of the same [`Callback`], so it can be
/// used for `unregister_one`.
#[derive(Debug, Clone)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<Recorded>>>,
    callback: Callback,
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRecorder {
    pub fn new() -> Self {
        let events: Arc<Mutex<Vec<Recorded>>> = Arc::default();
        let sink = Arc::clone(&events);
        let callback = Callback::new(move |dir: &Path, relative: &Path, kind| {
            sink.lock().unwrap().push(Recorded {
                dir: dir.to_path_buf(),
                relative: relative.to_path_buf(),
                kind,
                thread: thread::current().name().map(str::to_string),
            });
        });
        Self { events, callback }
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    pub fn any(&self, predicate: impl Fn(&Recorded) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(predicate)
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Wait until at least `n` invocations were recorded.
    pub fn wait_for_count(&self, n: usize, timeout: Duration) -> bool {
        wait_until(timeout, || self.count() >= n)
    }

    /// Wait until some invocation satisfies `predicate`.
    pub fn wait_for(&self, timeout: Duration, predicate: impl Fn(&Recorded) -> bool) -> bool {
        wait_until(timeout, || self.any(&predicate))
    }
}
