// src/engine/core.rs

//! Pure lifecycle state machine for the watch loop.
//!
//! This module decides *what* should happen on start and stop requests and
//! returns a step for the caller to carry out (spawn the loop thread, close
//! the service, raise the stop flag). It has no threads, no locks and no IO,
//! so every transition can be tested directly.
//!
//! ```text
//! NotStarted --start--> Running --request_stop--> Stopping --loop_exited--> Stopped
//!      \______________________request_stop______________________________/
//! ```

use crate::errors::{DirWatchError, Result};

/// Externally visible lifecycle state of a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchState {
    #[default]
    NotStarted,
    Running,
    Stopping,
    Stopped,
}

/// Outcome of [`Lifecycle::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStep {
    /// First start: the caller must spawn the loop thread.
    SpawnLoop,
    /// The loop already exists.
    AlreadyRunning,
}

/// Outcome of [`Lifecycle::request_stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStep {
    /// No loop was ever spawned; the caller closes the service itself.
    CloseService,
    /// Raise the stop flag; the loop closes the service on its way out.
    SignalLoop,
    /// Already stopping or stopped.
    Nothing,
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    state: WatchState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Whether registrations are still accepted.
    pub fn is_accepting(&self) -> bool {
        matches!(self.state, WatchState::NotStarted | WatchState::Running)
    }

    /// Move to `Running`, reporting whether the loop has to be spawned.
    ///
    /// Fails once a stop has been requested; a stopped watcher is not
    /// resumable.
    pub fn start(&mut self) -> Result<StartStep> {
        match self.state {
            WatchState::NotStarted => {
                self.state = WatchState::Running;
                Ok(StartStep::SpawnLoop)
            }
            WatchState::Running => Ok(StartStep::AlreadyRunning),
            WatchState::Stopping | WatchState::Stopped => Err(DirWatchError::WatcherStopped),
        }
    }

    /// Undo a `start` whose thread could not be spawned.
    pub fn spawn_failed(&mut self) {
        if self.state == WatchState::Running {
            self.state = WatchState::NotStarted;
        }
    }

    pub fn request_stop(&mut self) -> StopStep {
        match self.state {
            WatchState::NotStarted => {
                self.state = WatchState::Stopped;
                StopStep::CloseService
            }
            WatchState::Running => {
                self.state = WatchState::Stopping;
                StopStep::SignalLoop
            }
            WatchState::Stopping | WatchState::Stopped => StopStep::Nothing,
        }
    }

    /// Called by the loop after it closed the service.
    pub fn loop_exited(&mut self) {
        self.state = WatchState::Stopped;
    }
}
