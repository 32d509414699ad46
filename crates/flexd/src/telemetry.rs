//! Process-wide `tracing` subscriber for the service and the handlers it runs.
//!
//! Handler logs (`flexd::handler`) and service diagnostics share one
//! subscriber writing to stderr, so the platform collects both from the same
//! stream.

use std::io::{self, IsTerminal};

use flex_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, registry};

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Proof that the subscriber is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Output format chosen by the call that installed the subscriber.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Expression as configured.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// The embedding host already installed a global subscriber.
    #[error("failed to install telemetry subscriber: {source}")]
    Install {
        /// Error from the subscriber registry.
        #[source]
        source: TryInitError,
    },
}

/// Subscriber settings read from the service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    directives: String,
    format: LogFormat,
    ansi: bool,
}

impl LogSettings {
    fn from_config(config: &Config) -> Self {
        Self {
            directives: config.log_filter().trim().to_owned(),
            format: config.log_format(),
            ansi: config.log_format() == LogFormat::Compact && io::stderr().is_terminal(),
        }
    }

    fn filter(&self) -> Result<EnvFilter, TelemetryError> {
        EnvFilter::builder()
            .parse(&self.directives)
            .map_err(|error| TelemetryError::Filter {
                filter: self.directives.clone(),
                message: error.to_string(),
            })
    }

    fn install(&self) -> Result<LogFormat, TelemetryError> {
        let events = fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(self.ansi)
            .with_thread_names(true)
            .with_timer(UtcTime::rfc_3339());
        let subscriber = registry().with(self.filter()?);
        match self.format {
            LogFormat::Json => subscriber
                .with(events.json().flatten_event(true).with_current_span(false))
                .try_init(),
            LogFormat::Compact => subscriber.with(events.compact()).try_init(),
        }
        .map_err(|source| TelemetryError::Install { source })?;
        Ok(self.format)
    }
}

/// Installs the global subscriber on first use.
///
/// Later calls return a handle for the subscriber already in place, so hosts
/// embedding several services can call this freely.
///
/// # Errors
///
/// Fails when the filter is invalid or another subscriber already owns the
/// global slot.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let format = INSTALLED.get_or_try_init(|| LogSettings::from_config(config).install())?;
    Ok(TelemetryHandle { format: *format })
}
