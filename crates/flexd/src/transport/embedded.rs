//! Receiver for hosts that call into the service directly.
//!
//! There is no listener. `start` publishes the service behind an
//! [`EmbeddedEntryPoint`] and blocks until `stop`; each call on the entry
//! point decodes one task, dispatches it and returns the encoded result.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use flex_config::ReceiverKind;
use tracing::{info, warn};

use super::state::{Begin, RunState};
use super::{Receiver, ReceiverError, TRANSPORT_TARGET, line};
use crate::dispatch::FlexService;

/// Reply returned for input that is not a task.
const EMPTY_REPLY: &[u8] = b"{}";

type ServiceSlot = Arc<Mutex<Option<Arc<FlexService>>>>;

/// Receiver driven by calls from the embedding host.
#[derive(Debug, Default)]
pub struct EmbeddedReceiver {
    state: RunState,
    slot: ServiceSlot,
}

impl EmbeddedReceiver {
    /// Creates an idle receiver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle the host calls with task bytes.
    ///
    /// The handle may be taken before `start`; calls fail with
    /// [`ReceiverError::NotRunning`] until the receiver is started.
    #[must_use]
    pub fn entry_point(&self) -> EmbeddedEntryPoint {
        EmbeddedEntryPoint {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl Receiver for EmbeddedReceiver {
    fn kind(&self) -> ReceiverKind {
        ReceiverKind::Embedded
    }

    fn start(&self, service: Arc<FlexService>) -> Result<(), ReceiverError> {
        if self.state.begin()? == Begin::Cancelled {
            return Ok(());
        }
        *lock(&self.slot) = Some(service);
        info!(target: TRANSPORT_TARGET, "embedded entry point registered");
        self.state.wait_stop_requested();
        *lock(&self.slot) = None;
        self.state.finish();
        Ok(())
    }

    fn stop(&self) -> Result<(), ReceiverError> {
        if self.state.request_stop() {
            self.state.wait_idle();
        }
        Ok(())
    }

    fn entry_point(&self) -> Option<EmbeddedEntryPoint> {
        Some(EmbeddedEntryPoint {
            slot: Arc::clone(&self.slot),
        })
    }
}

/// Host-facing entry point: one call handles one task.
#[derive(Debug, Clone)]
pub struct EmbeddedEntryPoint {
    slot: ServiceSlot,
}

impl EmbeddedEntryPoint {
    /// Handles one encoded task and returns the encoded result.
    ///
    /// The health probe answers `{"status":"ready"}`, a rejected task answers
    /// `{"requestContinue":true}` and input that is not a task answers `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError::NotRunning`] when the receiver is not started.
    pub fn call(&self, input: &[u8]) -> Result<Vec<u8>, ReceiverError> {
        let service = lock(&self.slot)
            .as_ref()
            .map(Arc::clone)
            .ok_or(ReceiverError::NotRunning)?;
        Ok(line::answer(&service, input).unwrap_or_else(|error| {
            warn!(target: TRANSPORT_TARGET, %error, "embedded input is not a task");
            EMPTY_REPLY.to_vec()
        }))
    }
}

fn lock(slot: &ServiceSlot) -> MutexGuard<'_, Option<Arc<FlexService>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
