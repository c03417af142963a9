// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, trace};

use crate::errors::Result;
use crate::service::WatchKey;
use crate::watch::Dispatcher;
use crate::watch::watcher::WatcherShared;

/// The single background thread that serves every subscription of a
/// watcher.
///
/// This is the IO shell around the lifecycle in [`super::core`]: it blocks
/// on the watch service, and for every ready key it drains the pending
/// events, takes a snapshot of the key's subscriptions and hands both to the
/// [`Dispatcher`]. The registry lock is only held for the snapshot, never
/// while callbacks run.
pub(crate) struct WatchLoop {
    shared: Arc<WatcherShared>,
}

impl fmt::Debug for WatchLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchLoop").finish_non_exhaustive()
    }
}

impl WatchLoop {
    pub(crate) fn new(shared: Arc<WatcherShared>) -> Self {
        Self { shared }
    }

    /// Start the loop on a named OS thread.
    ///
    /// The thread is detached; it ends after a stop request has been
    /// observed and the service has been closed.
    pub(crate) fn spawn(self, name: String) -> Result<()> {
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run())?;
        debug!(thread = %name, "spawned watch loop thread");
        Ok(())
    }

    /// Main loop.
    ///
    /// - Exits once the stop flag is raised (checked at least once per poll
    ///   timeout).
    /// - Closes the service exactly once on the way out and marks the
    ///   watcher `Stopped`.
    pub(crate) fn run(self) {
        info!("watch loop started");
        let shared = &*self.shared;
        let service = shared.service();
        let timeout = shared.config().poll_timeout;
        let dispatcher = Dispatcher::new(shared, shared.filesystem(), shared.default_executor());

        while !shared.stop_requested() {
            let Some(key) = service.poll(timeout) else {
                continue;
            };
            self.handle_key(&dispatcher, key);
        }

        if let Err(err) = service.close() {
            debug!(error = %err, "closing watch service failed");
        }
        shared.loop_exited();
        info!("watch loop stopped");
    }

    fn handle_key(&self, dispatcher: &Dispatcher<'_>, key: WatchKey) {
        let shared = &*self.shared;
        let service = shared.service();
        let events = service.drain_events(key);

        match shared.snapshot(key) {
            Some(subscriptions) => {
                trace!(key = key.id(), events = events.len(), "dispatching ready key");
                dispatcher.dispatch(&subscriptions, &events);
            }
            None => {
                trace!(key = key.id(), dropped = events.len(), "ready key has no subscriptions");
            }
        }

        if !service.rearm(key) {
            shared.purge_invalidated(key);
        }
    }
}
