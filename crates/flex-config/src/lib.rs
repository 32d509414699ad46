//! Configuration for the Flex service runtime.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then an optional
//! configuration file, then `SDK_*` environment variables, then command-line
//! flags when the caller passes them. The transport is chosen with
//! `SDK_RECEIVER` (`http` when unset).

mod defaults;
mod modes;

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_HOST, DEFAULT_HTTP_PORT, DEFAULT_LOG_FILTER, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
    DEFAULT_TCP_PORT, default_host, default_http_port, default_log_filter, default_log_format,
    default_receiver, default_shutdown_timeout_secs, default_tcp_port,
};
pub use modes::{LogFormat, ModeParseError, ReceiverKind};

/// Runtime configuration shared by every receiver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SDK")]
pub struct Config {
    /// Transport used to receive tasks.
    #[ortho_config(default = defaults::default_receiver())]
    pub receiver: ReceiverKind,
    /// Interface the network receivers bind to.
    #[ortho_config(default = defaults::default_host())]
    pub host: String,
    /// Port for the HTTP receiver.
    #[ortho_config(default = defaults::default_http_port())]
    pub http_port: u16,
    /// Port for the TCP receiver.
    #[ortho_config(default = defaults::default_tcp_port())]
    pub tcp_port: u16,
    /// Secret every data, functions and auth task must carry in `authKey`.
    ///
    /// When unset or empty, the check is skipped.
    pub shared_secret: Option<String>,
    /// `tracing` filter expression.
    #[ortho_config(default = defaults::default_log_filter())]
    pub log_filter: String,
    /// Diagnostic output format.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Upper bound on a graceful shutdown, in seconds.
    #[ortho_config(default = defaults::default_shutdown_timeout_secs())]
    pub shutdown_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            receiver: default_receiver(),
            host: default_host(),
            http_port: DEFAULT_HTTP_PORT,
            tcp_port: DEFAULT_TCP_PORT,
            shared_secret: None,
            log_filter: default_log_filter(),
            log_format: default_log_format(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads configuration from defaults, files and the environment.
    ///
    /// Command-line arguments are ignored because the runtime is usually
    /// embedded in a program that owns its own flags.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a layer cannot be read or merged.
    pub fn resolve() -> Result<Self, Arc<OrthoError>> {
        Self::resolve_from([OsString::from(env!("CARGO_PKG_NAME"))])
    }

    /// Loads configuration, also honouring the supplied command-line flags.
    ///
    /// The first item is treated as the program name.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a flag is unknown or a layer is invalid.
    pub fn resolve_from<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the configured shared secret, if any.
    #[must_use]
    pub fn shared_secret(&self) -> Option<&str> {
        self.shared_secret.as_deref()
    }

    /// Returns the port used by the selected receiver.
    ///
    /// The embedded receiver does not listen and reports `None`.
    #[must_use]
    pub const fn listen_port(&self) -> Option<u16> {
        match self.receiver {
            ReceiverKind::Http => Some(self.http_port),
            ReceiverKind::Tcp => Some(self.tcp_port),
            ReceiverKind::Embedded => None,
        }
    }

    /// Returns `host:port` for the selected receiver.
    #[must_use]
    pub fn listen_address(&self) -> Option<String> {
        self.listen_port()
            .map(|port| format!("{}:{port}", self.host))
    }

    /// Returns the bound on a graceful shutdown.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
