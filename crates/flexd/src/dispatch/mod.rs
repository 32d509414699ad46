//! Task dispatch shared by every receiver.
//!
//! Receivers normalise inbound bytes into a [`Task`](flex_types::Task) and hand it to
//! [`FlexService::on_task_received`]. The service checks the shared secret
//! and the task type, then either answers a discovery probe itself or routes
//! the task to the matching registry.

mod service;

pub use self::service::{FlexService, SDK_VERSION};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

