use thiserror::Error;

use crate::task::Task;

/// Why a task was refused before reaching a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The task's `authKey` did not match the configured shared secret.
    #[error("shared secret mismatch")]
    SharedSecretMismatch,
    /// The task type is not one the dispatcher processes.
    #[error("unknown task type '{task_type}'")]
    UnknownTaskType {
        /// Task type as received.
        task_type: String,
    },
}

/// Result of handing one task to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task was refused; transports signal the platform to continue
    /// without a body.
    Rejected {
        /// Task as received.
        task: Task,
        /// Reason for the refusal.
        reason: RejectReason,
    },
    /// A handler (or the service itself) produced a result.
    Completed(Task),
}

impl TaskOutcome {
    /// Builds a rejection.
    #[must_use]
    pub const fn rejected(task: Task, reason: RejectReason) -> Self {
        Self::Rejected { task, reason }
    }

    /// Returns true for rejections.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns the task in either variant.
    #[must_use]
    pub const fn task(&self) -> &Task {
        match self {
            Self::Rejected { task, .. } | Self::Completed(task) => task,
        }
    }

    /// Returns the completed task, or `None` for a rejection.
    #[must_use]
    pub fn into_completed(self) -> Option<Task> {
        match self {
            Self::Completed(task) => Some(task),
            Self::Rejected { .. } => None,
        }
    }
}
