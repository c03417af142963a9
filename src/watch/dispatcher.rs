// src/watch/dispatcher.rs

//! Delivery of drained events to the subscriptions of one key.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, trace};

use super::subscription::{Callback, Subscription};
use crate::errors::Result;
use crate::exec::CallbackExecutor;
use crate::fs::FileSystem;
use crate::types::{EventKind, WatchEvent};

/// Something that can register a directory on behalf of an existing
/// subscription.
///
/// The dispatcher uses this to extend recursive subscriptions to newly
/// created subdirectories; the watcher implements it.
pub trait Registrar: Send + Sync {
    /// Register `dir` with the parameters (recursion, executor, callback,
    /// kinds) of `template`.
    fn register_like(&self, dir: &Path, template: &Subscription) -> Result<()>;
}

pub struct Dispatcher<'a> {
    registrar: &'a dyn Registrar,
    fs: &'a dyn FileSystem,
    default_executor: Option<&'a Arc<dyn CallbackExecutor>>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        registrar: &'a dyn Registrar,
        fs: &'a dyn FileSystem,
        default_executor: Option<&'a Arc<dyn CallbackExecutor>>,
    ) -> Self {
        Self {
            registrar,
            fs,
            default_executor,
        }
    }

    /// Deliver `events`, in order, to a snapshot of one key's subscriptions.
    pub fn dispatch(&self, subscriptions: &HashSet<Subscription>, events: &[WatchEvent]) {
        for event in events {
            self.dispatch_one(subscriptions, event);
        }
    }

    fn dispatch_one(&self, subscriptions: &HashSet<Subscription>, event: &WatchEvent) {
        if event.kind == EventKind::Create {
            self.extend_recursive(subscriptions, event);
        }

        for subscription in subscriptions.iter().filter(|s| s.wants(event.kind)) {
            self.invoke(subscription, event);
        }
    }

    /// Register a newly created subdirectory for every recursive
    /// subscription in the set.
    ///
    /// Runs before callbacks, so a callback reacting to the creation already
    /// sees the new directory watched.
    fn extend_recursive(&self, subscriptions: &HashSet<Subscription>, event: &WatchEvent) {
        // Every subscription in one set shares the same directory.
        let Some(first) = subscriptions.iter().find(|s| s.is_recursive()) else {
            return;
        };
        let created = first.directory().join(&event.relative_path);
        if !self.fs.is_dir(&created) {
            return;
        }

        for subscription in subscriptions.iter().filter(|s| s.is_recursive()) {
            match self.registrar.register_like(&created, subscription) {
                Ok(()) => debug!(dir = ?created, "registered new subdirectory"),
                Err(err) => error!(
                    dir = ?created,
                    error = %err,
                    "failed to register new subdirectory"
                ),
            }
        }
    }

    fn invoke(&self, subscription: &Subscription, event: &WatchEvent) {
        let callback = subscription.callback().clone();
        let dir = subscription.directory().to_path_buf();
        let relative = event.relative_path.clone();
        let kind = event.kind;

        match subscription.executor().or(self.default_executor) {
            Some(executor) => {
                trace!(?dir, ?relative, %kind, "submitting callback to executor");
                executor.execute(Box::new(move || {
                    run_isolated(&callback, &dir, &relative, kind)
                }));
            }
            None => run_isolated(&callback, &dir, &relative, kind),
        }
    }
}

/// Run a callback, logging instead of propagating a panic.
pub fn run_isolated(callback: &Callback, dir: &Path, relative: &Path, kind: EventKind) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback.call(dir, relative, kind)));
    if let Err(payload) = outcome {
        error!(
            ?dir,
            ?relative,
            %kind,
            panic = panic_message(payload.as_ref()),
            "callback panicked"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
