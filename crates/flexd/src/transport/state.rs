//! Run-state latch shared by `start` and `stop`.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::ReceiverError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    /// `stop` arrived before `start`; the next `begin` consumes it.
    StopPending,
    Running,
    Stopping,
}

/// What `start` should do after [`RunState::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub(crate) enum Begin {
    /// Serve until a stop is requested.
    Serve,
    /// A stop was already requested; return without serving.
    Cancelled,
}

/// Tracks whether a receiver is serving, and lets `stop` wait for `start` to
/// return.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    phase: Mutex<Phase>,
    changed: Condvar,
}

impl RunState {
    pub(crate) fn begin(&self) -> Result<Begin, ReceiverError> {
        let mut phase = self.lock();
        match *phase {
            Phase::Idle => {
                *phase = Phase::Running;
                Ok(Begin::Serve)
            }
            Phase::StopPending => {
                *phase = Phase::Idle;
                Ok(Begin::Cancelled)
            }
            Phase::Running | Phase::Stopping => Err(ReceiverError::AlreadyRunning),
        }
    }

    pub(crate) fn finish(&self) {
        *self.lock() = Phase::Idle;
        self.changed.notify_all();
    }

    /// Marks a running receiver as stopping. Returns false when there is
    /// nothing to wait for; on an idle receiver the stop is held for the next
    /// `begin`.
    pub(crate) fn request_stop(&self) -> bool {
        let mut phase = self.lock();
        match *phase {
            Phase::Running => {
                *phase = Phase::Stopping;
                self.changed.notify_all();
                true
            }
            Phase::Idle => {
                *phase = Phase::StopPending;
                false
            }
            Phase::StopPending | Phase::Stopping => false,
        }
    }

    pub(crate) fn is_stopping(&self) -> bool {
        *self.lock() == Phase::Stopping
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        *self.lock() == Phase::Running
    }

    /// Blocks until `finish` has been called.
    pub(crate) fn wait_idle(&self) {
        let phase = self.lock();
        drop(
            self.changed
                .wait_while(phase, |phase| *phase == Phase::Stopping)
                .unwrap_or_else(PoisonError::into_inner),
        );
    }

    /// Blocks while the receiver is running and no stop has been requested.
    pub(crate) fn wait_stop_requested(&self) {
        let phase = self.lock();
        drop(
            self.changed
                .wait_while(phase, |phase| *phase == Phase::Running)
                .unwrap_or_else(PoisonError::into_inner),
        );
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
