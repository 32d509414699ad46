//! Error surface for launching and supervising the service.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use super::shutdown::ShutdownError;
use crate::registry::RegistryError;
use crate::telemetry::TelemetryError;
use crate::transport::ReceiverError;

/// Errors surfaced while launching or supervising the service.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Signal handlers could not be installed.
    #[error("failed to install shutdown handling: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// The initializer rejected a registration.
    #[error("handler registration failed: {source}")]
    Registration {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
    /// The receiver failed to start or stop.
    #[error("receiver failed: {source}")]
    Receiver {
        /// Underlying receiver error.
        #[source]
        source: ReceiverError,
    },
    /// Draining was abandoned and the process was told to terminate.
    #[error("shutdown forced: {reason}")]
    ForcedShutdown {
        /// Why draining was abandoned.
        reason: String,
    },
    /// The shutdown coordinator thread panicked.
    #[error("shutdown coordinator panicked")]
    CoordinatorPanic,
}

impl LaunchError {
    /// Process exit status for this error.
    ///
    /// Configuration problems exit with 2; everything else with 1.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config { .. } | Self::Telemetry { .. } | Self::Registration { .. } => 2,
            Self::Shutdown { .. }
            | Self::Receiver { .. }
            | Self::ForcedShutdown { .. }
            | Self::CoordinatorPanic => 1,
        }
    }
}

impl From<Arc<OrthoError>> for LaunchError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Config { source }
    }
}

impl From<TelemetryError> for LaunchError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}

impl From<RegistryError> for LaunchError {
    fn from(source: RegistryError) -> Self {
        Self::Registration { source }
    }
}

impl From<ReceiverError> for LaunchError {
    fn from(source: ReceiverError) -> Self {
        Self::Receiver { source }
    }
}
