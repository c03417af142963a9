// src/exec/mod.rs

//! Execution targets for callbacks.
//!
//! A subscription may name an executor; its callbacks are then submitted
//! there as jobs instead of running inline on the watch loop thread.
//!
//! - [`backend`] provides the `CallbackExecutor` trait and a
//!   `TokioExecutor` that hands jobs to a runtime's blocking pool.
//! - [`executor_loop`] provides `SerialExecutor`, a dedicated worker thread
//!   fed over an mpsc channel that runs jobs one at a time, in order.

pub mod backend;
pub mod executor_loop;

pub use backend::{CallbackExecutor, Job, TokioExecutor};
pub use executor_loop::SerialExecutor;
