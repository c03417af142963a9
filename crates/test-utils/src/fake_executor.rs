use std::fmt;
use std::mem;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use dirwatch::exec::{CallbackExecutor, Job};

/// A fake execution target that:
/// - counts every submitted job
/// - runs it right away on the submitting thread, or holds it until
///   [`RecordingExecutor::run_pending`] when created with `deferred()`.
#[derive(Default)]
pub struct RecordingExecutor {
    submitted: AtomicUsize,
    deferred: bool,
    pending: Mutex<Vec<Job>>,
}

impl fmt::Debug for RecordingExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingExecutor")
            .field("submitted", &self.submitted())
            .field("deferred", &self.deferred)
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl RecordingExecutor {
    /// Executor that runs jobs inline as they are submitted.
    pub fn immediate() -> Self {
        Self::default()
    }

    /// Executor that queues jobs until `run_pending` is called.
    pub fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Run every queued job in submission order; returns how many ran.
    pub fn run_pending(&self) -> usize {
        let jobs = mem::take(&mut *self.pending.lock().unwrap());
        let n = jobs.len();
        for job in jobs {
            job();
        }
        n
    }
}

impl CallbackExecutor for RecordingExecutor {
    fn execute(&self, job: Job) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        if self.deferred {
            self.pending.lock().unwrap().push(job);
        } else {
            job();
        }
    }
}
