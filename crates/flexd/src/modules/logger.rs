use tracing::{error, info, warn};

const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handler");

/// Logger for handler code.
///
/// Events carry a `level_name` field with the platform's level names
/// (`info`, `warning`, `error`, `fatal`). Empty messages are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct Logger;

impl Logger {
    pub(super) const fn new() -> Self {
        Self
    }

    /// Logs at `info`.
    pub fn info(&self, message: &str) {
        if !message.is_empty() {
            info!(target: HANDLER_TARGET, level_name = "info", "{message}");
        }
    }

    /// Logs at `warning`.
    pub fn warn(&self, message: &str) {
        if !message.is_empty() {
            warn!(target: HANDLER_TARGET, level_name = "warning", "{message}");
        }
    }

    /// Logs at `error`.
    pub fn error(&self, message: &str) {
        if !message.is_empty() {
            error!(target: HANDLER_TARGET, level_name = "error", "{message}");
        }
    }

    /// Logs at `fatal`. The process keeps running.
    pub fn fatal(&self, message: &str) {
        if !message.is_empty() {
            error!(target: HANDLER_TARGET, level_name = "fatal", "{message}");
        }
    }
}
