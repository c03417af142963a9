// src/exec/executor_loop.rs

//! Single-threaded, order-preserving executor.

use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::{CallbackExecutor, Job};
use crate::errors::Result;

/// Executor backed by one dedicated worker thread.
///
/// Jobs run one at a time in submission order. The worker exits once every
/// handle to the executor has been dropped and the queue is drained.
#[derive(Debug)]
pub struct SerialExecutor {
    name: String,
    tx: mpsc::UnboundedSender<Job>,
}

impl SerialExecutor {
    /// Spawn the worker thread, named `name`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let worker = name.clone();
        thread::Builder::new().name(name.clone()).spawn(move || {
            info!(executor = %worker, "serial executor started");
            let mut ran = 0usize;
            while let Some(job) = rx.blocking_recv() {
                job();
                ran += 1;
            }
            info!(executor = %worker, ran, "serial executor finished (channel closed)");
        })?;

        debug!(executor = %name, "spawned serial executor");
        Ok(Self { name, tx })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CallbackExecutor for SerialExecutor {
    fn execute(&self, job: Job) {
        if self.tx.send(job).is_err() {
            warn!(executor = %self.name, "serial executor worker is gone; job dropped");
        }
    }
}
