#![allow(dead_code)]

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dirwatch::fs::mock::MockFileSystem;
use dirwatch::service::{MockWatchService, WatchService};
use dirwatch::{DirWatcher, EventKind, WatcherConfig};
use dirwatch_test_utils::{EventRecorder, init_tracing};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Bound for waits on the mock service; events arrive within a poll or two.
pub const WAIT: Duration = Duration::from_secs(5);

/// A watcher wired to an in-memory service and filesystem.
pub struct MockRig {
    pub watcher: DirWatcher,
    pub service: Arc<MockWatchService>,
    pub fs: MockFileSystem,
}

impl MockRig {
    pub fn new(fs: MockFileSystem) -> Self {
        Self::with_config(fs, WatcherConfig::default())
    }

    pub fn with_config(fs: MockFileSystem, config: WatcherConfig) -> Self {
        init_tracing();
        let service = Arc::new(MockWatchService::new());
        let watcher = DirWatcher::builder()
            .config(config)
            .service(Arc::clone(&service) as Arc<dyn WatchService>)
            .filesystem(Arc::new(fs.clone()))
            .build()
            .expect("build watcher");
        Self {
            watcher,
            service,
            fs,
        }
    }

    /// Fire `kind` for `relative` in `dir`.
    pub fn fire(&self, dir: impl AsRef<Path>, relative: &str, kind: EventKind) {
        self.service.fire(dir, relative, kind);
    }

    /// Register a fresh all-kinds recorder on `dir`, fire a sentinel event
    /// there and wait for it. Every event fired on `dir` before this call
    /// has been dispatched once it returns.
    pub fn barrier(&self, dir: impl AsRef<Path>) {
        let dir = dir.as_ref();
        let sentinel = EventRecorder::new();
        self.watcher
            .watch(dir, sentinel.callback())
            .expect("register sentinel");
        self.fire(dir, ".sentinel", EventKind::Create);
        assert!(
            sentinel.wait_for(WAIT, |e| e.relative == Path::new(".sentinel")),
            "sentinel event for {dir:?} never arrived"
        );
        self.watcher
            .unregister_one(dir, sentinel.callback())
            .expect("unregister sentinel");
    }
}

/// `/w/root` with nothing in it.
pub fn single_dir() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir("/w/root");
    fs
}

/// Recorded invocations, minus the ones caused by [`MockRig::barrier`].
pub fn user_events(recorder: &EventRecorder) -> Vec<dirwatch_test_utils::Recorded> {
    recorder
        .events()
        .into_iter()
        .filter(|e| e.relative != Path::new(".sentinel"))
        .collect()
}
