//! Structured reporting of service lifecycle events.

use std::sync::Arc;
use std::time::Duration;

use flex_config::{Config, ReceiverKind};

const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer of service lifecycle transitions.
#[cfg_attr(test, mockall::automock)]
pub trait LifecycleReporter: Send + Sync {
    /// Configuration is loaded and handlers are about to be registered.
    fn service_starting(&self, config: &Config);

    /// The receiver is about to start serving.
    fn receiver_started(&self, kind: ReceiverKind);

    /// A termination signal arrived and draining began.
    fn shutdown_requested(&self, signal: i32, timeout: Duration);

    /// The receiver drained cleanly.
    fn shutdown_completed(&self);

    /// Draining was abandoned.
    fn shutdown_forced(&self, reason: &str);
}

impl<T> LifecycleReporter for Arc<T>
where
    T: LifecycleReporter + ?Sized,
{
    fn service_starting(&self, config: &Config) {
        (**self).service_starting(config);
    }

    fn receiver_started(&self, kind: ReceiverKind) {
        (**self).receiver_started(kind);
    }

    fn shutdown_requested(&self, signal: i32, timeout: Duration) {
        (**self).shutdown_requested(signal, timeout);
    }

    fn shutdown_completed(&self) {
        (**self).shutdown_completed();
    }

    fn shutdown_forced(&self, reason: &str) {
        (**self).shutdown_forced(reason);
    }
}

/// Reporter that records lifecycle events with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredLifecycleReporter;

impl StructuredLifecycleReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LifecycleReporter for StructuredLifecycleReporter {
    fn service_starting(&self, config: &Config) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "service_starting",
            receiver = %config.receiver,
            address = config.listen_address().as_deref().unwrap_or("embedded"),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            shared_secret = config.shared_secret().is_some_and(|secret| !secret.is_empty()),
            "starting flex service"
        );
    }

    fn receiver_started(&self, kind: ReceiverKind) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "receiver_started",
            receiver = %kind,
            "receiver starting"
        );
    }

    fn shutdown_requested(&self, signal: i32, timeout: Duration) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "shutdown_requested",
            signal,
            timeout_ms = timeout.as_millis(),
            "shutdown signal received, draining receiver"
        );
    }

    fn shutdown_completed(&self) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "shutdown_completed",
            "receiver drained"
        );
    }

    fn shutdown_forced(&self, reason: &str) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "shutdown_forced",
            reason,
            "forcing process termination"
        );
    }
}
