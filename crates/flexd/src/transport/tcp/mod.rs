//! Newline-delimited JSON receiver over persistent TCP connections.
//!
//! Each accepted connection runs on its own thread and processes its messages
//! in arrival order. `stop` closes the listener and waits for every
//! connection worker to finish the message it is handling.

mod connection;
mod tracker;

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use flex_config::ReceiverKind;
use flex_types::wire::MAX_BODY_BYTES;
use tracing::{info, warn};

use self::tracker::WorkerTracker;
use super::state::{Begin, RunState};
use super::{Receiver, ReceiverError, TRANSPORT_TARGET};
use crate::dispatch::FlexService;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);
/// How often an idle connection checks for shutdown.
const READ_POLL: Duration = Duration::from_millis(250);

/// Receiver speaking the line protocol on `host:port`.
#[derive(Debug)]
pub struct TcpReceiver {
    address: String,
    state: Arc<RunState>,
    workers: Arc<WorkerTracker>,
    local_addr: Mutex<Option<SocketAddr>>,
    max_line_bytes: usize,
}

impl TcpReceiver {
    /// Creates a receiver that will bind `address` when started.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: Arc::default(),
            workers: Arc::default(),
            local_addr: Mutex::new(None),
            max_line_bytes: MAX_BODY_BYTES,
        }
    }

    /// Caps the size of one task message. Defaults to the HTTP body limit.
    #[must_use]
    pub fn with_max_line_bytes(mut self, limit: usize) -> Self {
        self.max_line_bytes = limit;
        self
    }

    /// Address actually bound, once the receiver is listening.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of connection workers still running.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.workers.active()
    }

    fn serve(&self, service: &Arc<FlexService>) -> Result<(), ReceiverError> {
        let listener = bind(&self.address)?;
        listener
            .set_nonblocking(true)
            .map_err(|source| ReceiverError::NonBlocking { source })?;
        let bound = listener.local_addr().ok();
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner) = bound;
        info!(
            target: TRANSPORT_TARGET,
            address = %self.address,
            bound = ?bound,
            "tcp receiver listening"
        );

        self.accept_loop(&listener, service);
        drop(listener);
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner) = None;

        info!(
            target: TRANSPORT_TARGET,
            active = self.workers.active(),
            "tcp listener closed, draining connections"
        );
        self.workers.wait_drained();
        Ok(())
    }

    fn accept_loop(&self, listener: &TcpListener, service: &Arc<FlexService>) {
        let mut last_error = None::<io::ErrorKind>;
        while !self.state.is_stopping() {
            match listener.accept() {
                Ok((stream, _)) => {
                    last_error = None;
                    if let Err(error) = stream
                        .set_nonblocking(false)
                        .and_then(|()| stream.set_read_timeout(Some(READ_POLL)))
                    {
                        warn!(target: TRANSPORT_TARGET, %error, "failed to configure connection");
                        continue;
                    }
                    let guard = self.workers.enter();
                    let service = Arc::clone(service);
                    let state = Arc::clone(&self.state);
                    let max_line = self.max_line_bytes;
                    thread::spawn(move || {
                        let _guard = guard;
                        connection::serve_connection(stream, &service, &state, max_line);
                    });
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_BACKOFF);
                }
                Err(error) => {
                    let kind = error.kind();
                    if last_error != Some(kind) {
                        warn!(target: TRANSPORT_TARGET, %error, "tcp accept error");
                    }
                    last_error = Some(kind);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
    }
}

impl Receiver for TcpReceiver {
    fn kind(&self) -> ReceiverKind {
        ReceiverKind::Tcp
    }

    fn start(&self, service: Arc<FlexService>) -> Result<(), ReceiverError> {
        if self.state.begin()? == Begin::Cancelled {
            return Ok(());
        }
        let result = self.serve(&service);
        self.state.finish();
        result
    }

    fn stop(&self) -> Result<(), ReceiverError> {
        if self.state.request_stop() {
            self.state.wait_idle();
        }
        Ok(())
    }
}

fn bind(address: &str) -> Result<TcpListener, ReceiverError> {
    let addr = address
        .to_socket_addrs()
        .map_err(|source| ReceiverError::Resolve {
            address: address.to_owned(),
            source,
        })?
        .next()
        .ok_or_else(|| ReceiverError::ResolveEmpty {
            address: address.to_owned(),
        })?;
    TcpListener::bind(addr).map_err(|source| ReceiverError::Bind {
        address: address.to_owned(),
        source,
    })
}
