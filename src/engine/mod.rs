// src/engine/mod.rs

//! The background watch loop.
//!
//! - [`core`] holds the pure lifecycle state machine
//!   (`NotStarted → Running → Stopping → Stopped`).
//! - [`runtime`] is the thread that polls the watch service, drains ready
//!   keys, hands each batch to the dispatcher and re-arms the key.

pub mod core;
pub mod runtime;

pub use core::{Lifecycle, StartStep, StopStep, WatchState};
pub(crate) use runtime::WatchLoop;
