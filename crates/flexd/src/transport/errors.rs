//! Error types for receiver operations.

use std::io;

use thiserror::Error;

/// Errors surfaced while starting, running or stopping a receiver.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// The listen address did not resolve.
    #[error("failed to resolve listen address {address}: {source}")]
    Resolve {
        /// Address as configured.
        address: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// The listen address resolved to nothing.
    #[error("no socket addresses resolved for {address}")]
    ResolveEmpty {
        /// Address as configured.
        address: String,
    },
    /// Binding the listening socket failed.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Address that could not be bound.
        address: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Switching the listener to non-blocking mode failed.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The async runtime backing the HTTP receiver could not be built.
    #[error("failed to build async runtime: {source}")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The HTTP server stopped with an error.
    #[error("http server failed: {source}")]
    Serve {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// `start` was called on a receiver that is already running.
    #[error("receiver is already running")]
    AlreadyRunning,
    /// The embedded entry point was called while no service is registered.
    #[error("embedded receiver is not running")]
    NotRunning,
}
