//! Task exchange shared by the line-oriented transports.

use flex_types::wire::{HEALTH_CHECK_MESSAGE, HEALTH_CHECK_REPLY, REQUEST_CONTINUE_REPLY};
use flex_types::{Task, TaskOutcome};
use tracing::debug;

use super::TRANSPORT_TARGET;
use crate::dispatch::FlexService;

/// Answers one pre-normalised task message.
///
/// The health probe is answered without dispatch, and a rejected task
/// produces the continue reply.
pub(crate) fn answer(service: &FlexService, message: &[u8]) -> Result<Vec<u8>, serde_json::Error> {
    let message = message.trim_ascii();
    if message == HEALTH_CHECK_MESSAGE.as_bytes() {
        return Ok(HEALTH_CHECK_REPLY.as_bytes().to_vec());
    }
    let task = Task::from_json_slice(message)?;
    match service.on_task_received(task) {
        TaskOutcome::Completed(task) => serde_json::to_vec(&task),
        TaskOutcome::Rejected { task, reason } => {
            debug!(
                target: TRANSPORT_TARGET,
                request_id = %task.request_id,
                %reason,
                "task rejected"
            );
            Ok(REQUEST_CONTINUE_REPLY.as_bytes().to_vec())
        }
    }
}
