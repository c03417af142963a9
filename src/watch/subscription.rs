// src/watch/subscription.rs

//! Callbacks and the subscriptions that bind them to a directory.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::exec::CallbackExecutor;
use crate::types::{EventKind, KindSet};

type CallbackFn = dyn Fn(&Path, &Path, EventKind) + Send + Sync;

/// A change-notification callback.
///
/// Invoked with the watched directory, the path of the changed entry
/// relative to it, and the kind of change. For `Overflow` the relative path
/// is empty.
///
/// Two `Callback`s are equal only if they are clones of the same value: the
/// identity of the shared closure is what `unregister_one` matches on, and
/// registering the same callback twice for one directory overrides the
/// earlier subscription.
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Path, &Path, EventKind) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, dir: &Path, relative: &Path, kind: EventKind) {
        (self.0)(dir, relative, kind)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Callback {}

impl Hash for Callback {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:#x})", self.addr())
    }
}

/// One registration: a callback bound to a canonical directory.
///
/// Equality and hashing only consider `(directory, callback)`, so a set of
/// subscriptions holds at most one entry per callback and directory.
#[derive(Clone)]
pub struct Subscription {
    directory: PathBuf,
    recursive: bool,
    executor: Option<Arc<dyn CallbackExecutor>>,
    callback: Callback,
    kinds: KindSet,
}

impl Subscription {
    pub fn new(
        directory: impl Into<PathBuf>,
        recursive: bool,
        executor: Option<Arc<dyn CallbackExecutor>>,
        callback: Callback,
        kinds: KindSet,
    ) -> Self {
        Self {
            directory: directory.into(),
            recursive,
            executor,
            callback,
            kinds,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn executor(&self) -> Option<&Arc<dyn CallbackExecutor>> {
        self.executor.as_ref()
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn kinds(&self) -> KindSet {
        self.kinds
    }

    /// Whether an event of `kind` is delivered to this subscription.
    pub fn wants(&self, kind: EventKind) -> bool {
        self.kinds.contains(kind)
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        self.directory == other.directory && self.callback == other.callback
    }
}

impl Eq for Subscription {}

impl Hash for Subscription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.directory.hash(state);
        self.callback.hash(state);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("directory", &self.directory)
            .field("recursive", &self.recursive)
            .field("executor", &self.executor)
            .field("callback", &self.callback)
            .field("kinds", &self.kinds)
            .finish()
    }
}
