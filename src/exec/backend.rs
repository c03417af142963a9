// src/exec/backend.rs

//! Pluggable execution target abstraction.
//!
//! The dispatcher talks to a `CallbackExecutor` instead of a concrete thread
//! pool, so callers can route callbacks onto whatever they already run
//! (a Tokio runtime, a UI thread, a test recorder).

use std::fmt::Debug;

use tokio::runtime::Handle;
use tracing::trace;

use crate::errors::{DirWatchError, Result};

/// A unit of work submitted to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Trait abstracting where callbacks run.
///
/// `execute` must not block the caller for long: it is called from the
/// watch loop thread. Jobs are already panic-isolated by the dispatcher.
pub trait CallbackExecutor: Send + Sync + Debug {
    fn execute(&self, job: Job);
}

/// Executor that runs jobs on a Tokio runtime's blocking pool.
///
/// Jobs may run concurrently and in any order.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is currently inside.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|err| DirWatchError::Other(anyhow::anyhow!("no tokio runtime: {err}")))
    }
}

impl CallbackExecutor for TokioExecutor {
    fn execute(&self, job: Job) {
        trace!("submitting callback to tokio blocking pool");
        // Detached: the dispatcher never awaits callbacks.
        drop(self.handle.spawn_blocking(job));
    }
}
