//! HTTP receiver.
//!
//! Each request is normalised by the pipeline its route selects and then
//! dispatched. The server runs on its own multi-threaded tokio runtime so
//! `start` can block the calling thread like the other receivers.

mod reply;
mod routes;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use flex_config::ReceiverKind;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

pub(crate) use self::routes::router;
use super::state::{Begin, RunState};
use super::{Receiver, ReceiverError, TRANSPORT_TARGET};
use crate::dispatch::FlexService;

/// Receiver serving the platform's HTTP routes on `host:port`.
#[derive(Debug)]
pub struct HttpReceiver {
    address: String,
    state: RunState,
    shutdown: watch::Sender<()>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl HttpReceiver {
    /// Creates a receiver that will bind `address` when started.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        let (shutdown, _) = watch::channel(());
        Self {
            address: address.into(),
            state: RunState::default(),
            shutdown,
            local_addr: Mutex::new(None),
        }
    }

    /// Address actually bound, once the receiver is listening.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn serve(
        &self,
        service: Arc<FlexService>,
        mut stop: watch::Receiver<()>,
    ) -> Result<(), ReceiverError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name(concat!(env!("CARGO_PKG_NAME"), "-http"))
            .build()
            .map_err(|source| ReceiverError::Runtime { source })?;

        runtime.block_on(async {
            let listener = TcpListener::bind(&self.address).await.map_err(|source| {
                ReceiverError::Bind {
                    address: self.address.clone(),
                    source,
                }
            })?;
            let bound = listener.local_addr().ok();
            self.set_local_addr(bound);
            info!(
                target: TRANSPORT_TARGET,
                address = %self.address,
                bound = ?bound,
                "http receiver listening"
            );

            let served = axum::serve(listener, router(service))
                .with_graceful_shutdown(async move {
                    // The sender lives as long as the receiver, so this only
                    // resolves on `stop`.
                    stop.changed().await.ok();
                })
                .await
                .map_err(|source| ReceiverError::Serve { source });
            self.set_local_addr(None);
            info!(target: TRANSPORT_TARGET, "http receiver drained");
            served
        })
    }

    fn set_local_addr(&self, addr: Option<SocketAddr>) {
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner) = addr;
    }
}

impl Receiver for HttpReceiver {
    fn kind(&self) -> ReceiverKind {
        ReceiverKind::Http
    }

    fn start(&self, service: Arc<FlexService>) -> Result<(), ReceiverError> {
        let stop = self.shutdown.subscribe();
        if self.state.begin()? == Begin::Cancelled {
            return Ok(());
        }
        let result = self.serve(service, stop);
        self.state.finish();
        result
    }

    fn stop(&self) -> Result<(), ReceiverError> {
        if self.state.request_stop() {
            self.shutdown.send_replace(());
            self.state.wait_idle();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpStream;

    use rstest::rstest;

    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::transport::test_support::{SlowService, start_in_background, wait_for};

    fn exchange(addr: SocketAddr, request: &[u8]) -> String {
        let mut client = TcpStream::connect(addr).expect("connect");
        client.write_all(request).expect("write request");
        let mut response = String::new();
        client.read_to_string(&mut response).expect("read response");
        response
    }

    #[rstest]
    fn serves_until_stopped() {
        let receiver = Arc::new(HttpReceiver::new("127.0.0.1:0"));
        let server = start_in_background(&receiver, FlexService::new());
        let addr = wait_for(|| receiver.local_addr()).expect("receiver listening");

        let response = exchange(
            addr,
            b"POST /healthcheck HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with(r#"{"healthy":true}"#));

        receiver.stop().expect("stop");
        server
            .join()
            .expect("join server")
            .expect("receiver exits cleanly");
        assert!(receiver.local_addr().is_none());
    }

    #[rstest]
    fn stop_before_start_cancels_the_run() {
        let receiver = Arc::new(HttpReceiver::new("127.0.0.1:0"));
        receiver.stop().expect("stop");
        let server = start_in_background(&receiver, FlexService::new());
        wait_for(|| server.is_finished().then_some(()))
            .expect("start returns after an earlier stop");
        server
            .join()
            .expect("join server")
            .expect("cancelled start is not an error");
        assert!(receiver.local_addr().is_none());
    }

    #[rstest]
    fn stop_waits_for_a_request_in_flight() {
        let mut slow = SlowService::new(Duration::from_millis(300));
        let receiver = Arc::new(HttpReceiver::new("127.0.0.1:0"));
        let server = start_in_background(&receiver, std::mem::take(&mut slow.service));
        let addr = wait_for(|| receiver.local_addr()).expect("receiver listening");
        let client = thread::spawn(move || {
            exchange(
                addr,
                b"POST /_flexFunctions/slow HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
            )
        });

        slow.entered.wait();
        receiver.stop().expect("stop");
        assert!(slow.has_finished(), "stop returned while the handler was running");

        let response = client.join().expect("join client");
        assert!(response.starts_with("HTTP/1.1 200"), "unexpected reply: {response}");
        assert!(response.contains(r#""body":{"slow":true}"#));
        server
            .join()
            .expect("join server")
            .expect("receiver exits cleanly");
    }

    #[rstest]
    fn occupied_port_is_a_bind_error() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = occupied.local_addr().expect("addr").to_string();
        let receiver = HttpReceiver::new(address);
        let error = receiver
            .start(Arc::new(FlexService::new()))
            .expect_err("bind should fail");
        assert!(matches!(error, ReceiverError::Bind { .. }));
    }
}
