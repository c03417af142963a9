// src/watch/mod.rs

//! Registration and dispatch.
//!
//! This module is responsible for:
//! - Binding callbacks to canonical directories (`subscription.rs`).
//! - Tracking which subscriptions belong to which watch key
//!   (`registry.rs`).
//! - Fanning drained events out to matching subscriptions, including the
//!   pickup of new subdirectories for recursive ones (`dispatcher.rs`).
//! - The public [`DirWatcher`] API (`watcher.rs`).
//!
//! It does **not** talk to the OS directly; that is the job of a
//! [`crate::service::WatchService`].

pub mod dispatcher;
pub mod registry;
pub mod subscription;
pub mod watcher;

pub use dispatcher::{Dispatcher, Registrar, run_isolated};
pub use registry::{Registry, SubscriptionSet, Upsert};
pub use subscription::{Callback, Subscription};
pub use watcher::{DirWatcher, DirWatcherBuilder};
