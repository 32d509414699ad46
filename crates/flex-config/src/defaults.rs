use crate::modes::{LogFormat, ReceiverKind};

/// Port the HTTP receiver listens on.
pub const DEFAULT_HTTP_PORT: u16 = 10001;

/// Port the TCP receiver listens on.
pub const DEFAULT_TCP_PORT: u16 = 7000;

/// Interface both network receivers bind to.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Seconds a graceful shutdown may take before the process is terminated.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 50;

/// Owned default host, for serde and `Default`.
#[must_use]
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Owned default log filter, for serde and `Default`.
#[must_use]
pub fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default HTTP port.
#[must_use]
pub const fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

/// Default TCP port.
#[must_use]
pub const fn default_tcp_port() -> u16 {
    DEFAULT_TCP_PORT
}

/// Default shutdown bound.
#[must_use]
pub const fn default_shutdown_timeout_secs() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

/// Default receiver.
#[must_use]
pub const fn default_receiver() -> ReceiverKind {
    ReceiverKind::Http
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
