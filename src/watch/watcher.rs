// src/watch/watcher.rs

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, error, info, warn};

use crate::config::{WatcherConfig, validate_config};
use crate::engine::{Lifecycle, StartStep, StopStep, WatchLoop, WatchState};
use crate::errors::{DirWatchError, Result};
use crate::exec::CallbackExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::service::{NotifyWatchService, WatchKey, WatchService};
use crate::types::KindSet;
use crate::watch::dispatcher::Registrar;
use crate::watch::registry::{Registry, SubscriptionSet, Upsert};
use crate::watch::subscription::{Callback, Subscription};

/// Numbers loop threads across all watchers in the process.
static LOOP_THREAD_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Directory watcher multiplexing callback subscriptions onto one watch
/// handle per canonical directory.
///
/// The background loop starts on the first successful registration. Dropping
/// the watcher stops it.
///
/// ```no_run
/// use dirwatch::{Callback, DirWatcher, EventKind};
///
/// # fn main() -> dirwatch::Result<()> {
/// let watcher = DirWatcher::new()?;
/// let on_change = Callback::new(|dir, relative, kind| {
///     println!("{kind}: {}", dir.join(relative).display());
/// });
/// watcher.register("/tmp", true, None, &on_change, [EventKind::Create, EventKind::Delete])?;
/// # Ok(())
/// # }
/// ```
pub struct DirWatcher {
    shared: Arc<WatcherShared>,
}

impl fmt::Debug for DirWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirWatcher")
            .field("shared", &self.shared)
            .finish()
    }
}

impl DirWatcher {
    /// Watcher on the `notify` backend and the real filesystem.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> DirWatcherBuilder {
        DirWatcherBuilder::default()
    }

    /// Register `callback` on `dir` for the given event kinds.
    ///
    /// - `dir` is resolved to its canonical form; the callback always
    ///   receives that form.
    /// - With `recursive`, every existing subdirectory is registered too,
    ///   and subdirectories created later are picked up as they appear.
    /// - `executor` decides where the callback runs. Without one, the
    ///   watcher's default executor is used, and without that the callback
    ///   runs inline on the watch loop thread.
    ///
    /// Registering a callback again for the same directory replaces the
    /// earlier subscription.
    pub fn register(
        &self,
        dir: impl AsRef<Path>,
        recursive: bool,
        executor: Option<Arc<dyn CallbackExecutor>>,
        callback: &Callback,
        kinds: impl Into<KindSet>,
    ) -> Result<()> {
        self.shared
            .register_tree(dir.as_ref(), recursive, executor, callback, kinds.into())
    }

    /// [`register`](Self::register) for every event kind.
    pub fn register_all(
        &self,
        dir: impl AsRef<Path>,
        recursive: bool,
        executor: Option<Arc<dyn CallbackExecutor>>,
        callback: &Callback,
    ) -> Result<()> {
        self.register(dir, recursive, executor, callback, KindSet::ALL)
    }

    /// Non-recursive registration for every event kind, on the default
    /// executor.
    pub fn watch(&self, dir: impl AsRef<Path>, callback: &Callback) -> Result<()> {
        self.register_all(dir, false, None, callback)
    }

    /// Drop every subscription on `dir`.
    ///
    /// Returns `false` if the directory was not registered. Subdirectories
    /// registered through a recursive registration keep their
    /// subscriptions.
    pub fn unregister_all(&self, dir: impl AsRef<Path>) -> Result<bool> {
        self.shared.unregister_all(dir.as_ref())
    }

    /// Drop the subscription of `callback` on `dir`.
    ///
    /// Returns `true` if a subscription was removed.
    pub fn unregister_one(&self, dir: impl AsRef<Path>, callback: &Callback) -> Result<bool> {
        self.shared.unregister_one(dir.as_ref(), callback)
    }

    /// Request shutdown without waiting for the loop thread.
    ///
    /// A callback already running is allowed to finish. Stopping is final.
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn state(&self) -> WatchState {
        self.shared.state()
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.shared.config
    }

    /// Whether `dir` currently has at least one subscription.
    pub fn is_watching(&self, dir: impl AsRef<Path>) -> Result<bool> {
        let canonical = self.shared.canonical(dir.as_ref())?;
        Ok(self.shared.lock().registry.is_watched(&canonical))
    }

    /// Canonical directories that currently have subscriptions, sorted.
    pub fn watched_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .shared
            .lock()
            .registry
            .directories()
            .map(Path::to_path_buf)
            .collect();
        dirs.sort();
        dirs
    }
}

impl Drop for DirWatcher {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

/// Builder for [`DirWatcher`].
#[derive(Default)]
pub struct DirWatcherBuilder {
    config: WatcherConfig,
    service: Option<Arc<dyn WatchService>>,
    fs: Option<Arc<dyn FileSystem>>,
    default_executor: Option<Arc<dyn CallbackExecutor>>,
}

impl fmt::Debug for DirWatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirWatcherBuilder")
            .field("config", &self.config)
            .field("service", &self.service)
            .field("fs", &self.fs)
            .field("default_executor", &self.default_executor)
            .finish()
    }
}

impl DirWatcherBuilder {
    pub fn config(mut self, config: WatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Watch service to drive. The watcher takes exclusive ownership of it
    /// and closes it on stop.
    pub fn service(mut self, service: Arc<dyn WatchService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Executor for subscriptions registered without one.
    pub fn default_executor(mut self, executor: Arc<dyn CallbackExecutor>) -> Self {
        self.default_executor = Some(executor);
        self
    }

    pub fn build(self) -> Result<DirWatcher> {
        validate_config(&self.config)?;

        let service: Arc<dyn WatchService> = match self.service {
            Some(service) => service,
            None => Arc::new(NotifyWatchService::new()?),
        };
        let fs: Arc<dyn FileSystem> = match self.fs {
            Some(fs) => fs,
            None => Arc::new(RealFileSystem),
        };

        let shared = Arc::new_cyclic(|me| WatcherShared {
            me: me.clone(),
            config: self.config,
            service,
            fs,
            default_executor: self.default_executor,
            guarded: Mutex::new(Guarded::default()),
            stop_requested: AtomicBool::new(false),
        });
        Ok(DirWatcher { shared })
    }
}

#[derive(Debug, Default)]
struct Guarded {
    registry: Registry,
    lifecycle: Lifecycle,
}

/// State shared between the public handle and the loop thread.
///
/// One mutex guards both the registry and the lifecycle, so starting the
/// loop is decided atomically with the registration that triggers it.
pub(crate) struct WatcherShared {
    me: Weak<WatcherShared>,
    config: WatcherConfig,
    service: Arc<dyn WatchService>,
    fs: Arc<dyn FileSystem>,
    default_executor: Option<Arc<dyn CallbackExecutor>>,
    guarded: Mutex<Guarded>,
    stop_requested: AtomicBool,
}

impl fmt::Debug for WatcherShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guarded = self.lock();
        f.debug_struct("WatcherShared")
            .field("state", &guarded.lifecycle.state())
            .field("directories", &guarded.registry.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WatcherShared {
    fn lock(&self) -> MutexGuard<'_, Guarded> {
        self.guarded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn config(&self) -> &WatcherConfig {
        &self.config
    }

    pub(crate) fn service(&self) -> &dyn WatchService {
        self.service.as_ref()
    }

    pub(crate) fn filesystem(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub(crate) fn default_executor(&self) -> Option<&Arc<dyn CallbackExecutor>> {
        self.default_executor.as_ref()
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn state(&self) -> WatchState {
        self.lock().lifecycle.state()
    }

    pub(crate) fn snapshot(&self, key: WatchKey) -> Option<SubscriptionSet> {
        self.lock().registry.snapshot(key)
    }

    /// Drop the registry entries of a key the service reported invalid.
    pub(crate) fn purge_invalidated(&self, key: WatchKey) {
        if let Some(dir) = self.lock().registry.purge_key(key) {
            info!(?dir, key = key.id(), "watched directory is gone; subscriptions dropped");
        }
    }

    pub(crate) fn loop_exited(&self) {
        self.lock().lifecycle.loop_exited();
    }

    /// Canonical form of `dir`.
    fn canonical(&self, dir: &Path) -> Result<PathBuf> {
        self.fs
            .canonicalize(dir)
            .map_err(|err| DirWatchError::PathResolution {
                path: dir.to_path_buf(),
                reason: format!("{err:#}"),
            })
    }

    /// Canonical form of `dir`, which must be a directory.
    fn canonical_dir(&self, dir: &Path) -> Result<PathBuf> {
        let canonical = self.canonical(dir)?;
        if !self.fs.is_dir(&canonical) {
            return Err(DirWatchError::NotADirectory(canonical));
        }
        Ok(canonical)
    }

    fn register_tree(
        &self,
        dir: &Path,
        recursive: bool,
        executor: Option<Arc<dyn CallbackExecutor>>,
        callback: &Callback,
        kinds: KindSet,
    ) -> Result<()> {
        if kinds.is_empty() {
            return Err(DirWatchError::MissingArgument("kinds"));
        }
        let canonical = self.canonical_dir(dir)?;
        let template = Subscription::new(canonical, recursive, executor, callback.clone(), kinds);
        self.register_subscription(template)
    }

    /// Register `template` and, if it is recursive, every directory below
    /// it.
    fn register_subscription(&self, template: Subscription) -> Result<()> {
        self.register_one(template.clone())?;

        if template.is_recursive() {
            let root = template.directory().to_path_buf();
            let mut visited = HashSet::from([root.clone()]);
            self.register_children(&root, &template, &mut visited);
        }
        Ok(())
    }

    /// Insert one subscription, arming the service and starting the loop as
    /// needed. This is the only place the registry grows.
    fn register_one(&self, subscription: Subscription) -> Result<()> {
        let dir = subscription.directory().to_path_buf();
        let mut guarded = self.lock();
        if !guarded.lifecycle.is_accepting() {
            return Err(DirWatchError::WatcherStopped);
        }

        // Always armed for every kind; filtering happens per subscription.
        // A key left armed by a failed call has no subscriptions, so its
        // events are dropped by the loop.
        let key = self.service.register(&dir, KindSet::ALL)?;

        // The loop cannot observe the registry before the lock is released.
        if guarded.lifecycle.start()? == StartStep::SpawnLoop {
            if let Err(err) = self.spawn_loop() {
                guarded.lifecycle.spawn_failed();
                return Err(err);
            }
        }

        if guarded.registry.insert(key, subscription) == Upsert::Overridden {
            warn!(?dir, "callback already registered for directory; overriding");
        }
        debug!(?dir, key = key.id(), "registered subscription");
        Ok(())
    }

    /// Walk `dir` depth-first, registering every subdirectory like
    /// `template`.
    ///
    /// Runs without the lock. Failures are logged and skipped so siblings
    /// are still processed; `visited` guards against symlink cycles.
    fn register_children(
        &self,
        dir: &Path,
        template: &Subscription,
        visited: &mut HashSet<PathBuf>,
    ) {
        let children = match self.fs.read_dir(dir) {
            Ok(children) => children,
            Err(err) => {
                warn!(?dir, error = %format!("{err:#}"), "cannot list directory; subtree skipped");
                return;
            }
        };

        for child in children.into_iter().filter(|c| self.fs.is_dir(c)) {
            let canonical = match self.canonical(&child) {
                Ok(canonical) => canonical,
                Err(err) => {
                    warn!(dir = ?child, error = %err, "cannot resolve subdirectory; skipped");
                    continue;
                }
            };
            if !visited.insert(canonical.clone()) {
                debug!(dir = ?canonical, "directory already visited in this pass");
                continue;
            }

            let subscription = Subscription::new(
                canonical.clone(),
                template.is_recursive(),
                template.executor().cloned(),
                template.callback().clone(),
                template.kinds(),
            );
            if let Err(err) = self.register_one(subscription) {
                error!(dir = ?canonical, error = %err, "failed to register subdirectory");
                continue;
            }
            self.register_children(&canonical, template, visited);
        }
    }

    fn spawn_loop(&self) -> Result<()> {
        let shared = self.me.upgrade().ok_or(DirWatchError::WatcherStopped)?;
        let n = LOOP_THREAD_COUNT.fetch_add(1, Ordering::SeqCst);
        let name = format!("{}-{}", self.config.thread_name_prefix, n);
        WatchLoop::new(shared).spawn(name)
    }

    fn unregister_all(&self, dir: &Path) -> Result<bool> {
        let canonical = self.canonical(dir)?;
        let removed = self.lock().registry.remove_directory(&canonical);
        debug!(dir = ?canonical, removed, "unregister all");
        Ok(removed)
    }

    fn unregister_one(&self, dir: &Path, callback: &Callback) -> Result<bool> {
        let canonical = self.canonical(dir)?;
        let removed = self.lock().registry.remove_callback(&canonical, callback);
        debug!(dir = ?canonical, ?callback, removed, "unregister one");
        Ok(removed)
    }

    fn stop(&self) {
        let step = self.lock().lifecycle.request_stop();
        match step {
            StopStep::SignalLoop => {
                self.stop_requested.store(true, Ordering::SeqCst);
                debug!("stop requested; loop will exit on its next poll");
            }
            StopStep::CloseService => {
                if let Err(err) = self.service.close() {
                    debug!(error = %err, "closing watch service failed");
                }
                info!("watcher stopped before its loop started");
            }
            StopStep::Nothing => {}
        }
    }
}

impl Registrar for WatcherShared {
    fn register_like(&self, dir: &Path, template: &Subscription) -> Result<()> {
        let canonical = self.canonical_dir(dir)?;
        let subscription = Subscription::new(
            canonical,
            template.is_recursive(),
            template.executor().cloned(),
            template.callback().clone(),
            template.kinds(),
        );
        self.register_subscription(subscription)
    }
}
