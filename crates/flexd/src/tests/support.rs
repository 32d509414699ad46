//! Shared doubles and fixtures for the behavioural suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver as Inbox, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use flex_config::{Config, ReceiverKind};
use flex_types::{Request, TaskOutcome};
use serde_json::json;

use crate::completion::{AuthCompletionHandler, CompletionHandler};
use crate::dispatch::FlexService;
use crate::lifecycle::LifecycleReporter;
use crate::modules::Modules;
use crate::process::{SignalSource, Terminator};

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lifecycle events recorded during a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Configuration loaded.
    Starting,
    /// Receiver about to serve.
    ReceiverStarted(ReceiverKind),
    /// A signal started the drain.
    ShutdownRequested(i32),
    /// The drain finished.
    ShutdownCompleted,
    /// The drain was abandoned.
    ShutdownForced(String),
}

/// Records lifecycle events for assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingReporter {
    /// Copy of the recorded events.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().expect("reporter mutex poisoned").clone()
    }

    fn record(&self, event: LifecycleEvent) {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .push(event);
    }
}

impl LifecycleReporter for RecordingReporter {
    fn service_starting(&self, _config: &Config) {
        self.record(LifecycleEvent::Starting);
    }

    fn receiver_started(&self, kind: ReceiverKind) {
        self.record(LifecycleEvent::ReceiverStarted(kind));
    }

    fn shutdown_requested(&self, signal: i32, _timeout: Duration) {
        self.record(LifecycleEvent::ShutdownRequested(signal));
    }

    fn shutdown_completed(&self) {
        self.record(LifecycleEvent::ShutdownCompleted);
    }

    fn shutdown_forced(&self, reason: &str) {
        self.record(LifecycleEvent::ShutdownForced(reason.to_owned()));
    }
}

/// Signal source fed from a channel.
pub struct ChannelSignals(Inbox<i32>);

impl ChannelSignals {
    /// Returns the source and the sender that raises signals on it.
    pub fn pair() -> (Self, Sender<i32>) {
        let (send, receive) = mpsc::channel();
        (Self(receive), send)
    }
}

impl SignalSource for ChannelSignals {
    fn next_signal(&mut self) -> Option<i32> {
        self.0.recv().ok()
    }
}

/// Terminator that counts calls instead of exiting.
#[derive(Debug, Default, Clone)]
pub struct CountingTerminator {
    calls: Arc<AtomicUsize>,
}

impl CountingTerminator {
    /// Number of termination requests seen.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Terminator for CountingTerminator {
    fn terminate(&self, _code: i32) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Service with one handler per domain.
///
/// `echo` answers the request body, `login` issues a token for the
/// username, and the `widgets` service object answers by id and by count.
pub fn sample_service() -> FlexService {
    let mut service = FlexService::new();
    service.functions.register(
        "echo",
        |request: &Request, complete: CompletionHandler, _: &Modules| {
            complete
                .set_json_body(json!({ "echo": request.body.to_json_value() }))
                .ok()
                .done()
        },
    );
    service.auth.register(
        "login",
        |request: &Request, complete: AuthCompletionHandler, _: &Modules| -> TaskOutcome {
            complete
                .set_token(format!("token-{}", request.username))
                .ok()
                .done()
        },
    );
    service
        .data
        .service_object("widgets")
        .on_get_by_id(|request: &Request, complete: CompletionHandler, _: &Modules| {
            complete
                .set_json_body(json!({ "_id": request.entity_id }))
                .ok()
                .done()
        })
        .on_get_count(|_: &Request, complete: CompletionHandler, _: &Modules| {
            complete.set_json_body(json!({ "count": 3 })).ok().done()
        });
    service
}

/// Polls `probe` until it yields a value or the wait times out.
pub fn wait_for<T>(mut probe: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if let Some(value) = probe() {
            return Some(value);
        }
        thread::sleep(POLL_INTERVAL);
    }
    None
}
