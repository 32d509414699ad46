//! Transport receivers.
//!
//! Every receiver implements [`Receiver`]: `start` blocks the calling thread
//! while tasks are served and `stop`, called from another thread, drains
//! in-flight work and makes `start` return. [`receiver_for`] picks the
//! implementation named by the configuration.

mod embedded;
mod errors;
mod http;
mod line;
mod state;
mod tcp;

use std::sync::Arc;

use flex_config::{Config, ReceiverKind};

pub use self::embedded::{EmbeddedEntryPoint, EmbeddedReceiver};
pub use self::errors::ReceiverError;
pub use self::http::HttpReceiver;
pub(crate) use self::http::router;
pub use self::tcp::TcpReceiver;
use crate::dispatch::FlexService;

pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Uniform start/stop contract shared by the transports.
pub trait Receiver: Send + Sync {
    /// Transport this receiver implements.
    fn kind(&self) -> ReceiverKind;

    /// Serves tasks until [`Receiver::stop`] is called.
    ///
    /// # Errors
    ///
    /// Fails when the receiver is already running or cannot listen.
    fn start(&self, service: Arc<FlexService>) -> Result<(), ReceiverError>;

    /// Stops serving and waits for in-flight work to finish.
    ///
    /// Returns immediately when the receiver is not running.
    ///
    /// # Errors
    ///
    /// Reserved for transports whose teardown can fail.
    fn stop(&self) -> Result<(), ReceiverError>;

    /// Host entry point, for receivers driven by direct calls.
    fn entry_point(&self) -> Option<EmbeddedEntryPoint> {
        None
    }
}

/// Builds the receiver selected by `config`.
#[must_use]
pub fn receiver_for(config: &Config) -> Arc<dyn Receiver> {
    match (config.receiver, config.listen_address()) {
        (ReceiverKind::Http, Some(address)) => Arc::new(HttpReceiver::new(address)),
        (ReceiverKind::Tcp, Some(address)) => Arc::new(TcpReceiver::new(address)),
        (ReceiverKind::Embedded, _) | (_, None) => Arc::new(EmbeddedReceiver::new()),
    }
}
