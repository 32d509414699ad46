use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{debug, warn};

use super::{FORCED_EXIT_CODE, PROCESS_TARGET};
use crate::lifecycle::LifecycleReporter;
use crate::transport::{Receiver, ReceiverError};

/// Blocking source of termination signals.
pub trait SignalSource: Send + 'static {
    /// Blocks until the next signal. `None` means no more signals will come.
    fn next_signal(&mut self) -> Option<i32>;
}

/// Errors reported while installing signal handling.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// SIGTERM and SIGINT delivered through `signal-hook`.
pub struct SystemSignals {
    signals: Signals,
}

impl SystemSignals {
    /// Installs the handlers.
    ///
    /// # Errors
    ///
    /// Fails when the handlers cannot be registered.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals =
            Signals::new([SIGTERM, SIGINT]).map_err(|source| ShutdownError::Install { source })?;
        Ok(Self { signals })
    }
}

impl SignalSource for SystemSignals {
    fn next_signal(&mut self) -> Option<i32> {
        self.signals.forever().next()
    }
}

/// Ends the process when draining is abandoned.
#[cfg_attr(test, mockall::automock)]
pub trait Terminator: Send + Sync {
    /// Terminates with `code`. Production implementations do not return.
    fn terminate(&self, code: i32);
}

/// Terminator backed by [`std::process::exit`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// How a supervised shutdown ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The receiver drained within the bound.
    Drained,
    /// Draining was abandoned and the terminator was invoked.
    Forced {
        /// Why draining was abandoned.
        reason: String,
    },
    /// The signal source closed before any signal arrived.
    SignalsClosed,
}

enum Event {
    Signal(i32),
    SignalsClosed,
    Drained(Result<(), ReceiverError>),
}

/// Turns termination signals into a bounded drain of the active receiver.
///
/// The first signal stops the receiver on a helper thread. A second signal,
/// a failed stop or the drain bound elapsing invokes the terminator with a
/// non-zero code.
pub struct ShutdownCoordinator<S, T> {
    signals: S,
    terminator: T,
    timeout: Duration,
    reporter: Arc<dyn LifecycleReporter>,
    signalled: Arc<AtomicBool>,
}

impl<S, T> ShutdownCoordinator<S, T>
where
    S: SignalSource,
    T: Terminator,
{
    /// Creates a coordinator draining for at most `timeout`.
    pub fn new(
        signals: S,
        terminator: T,
        timeout: Duration,
        reporter: Arc<dyn LifecycleReporter>,
    ) -> Self {
        Self {
            signals,
            terminator,
            timeout,
            reporter,
            signalled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag raised once a signal has started the drain.
    ///
    /// It is set before the receiver is asked to stop.
    #[must_use]
    pub fn signalled(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.signalled)
    }

    /// Waits for a signal, then supervises the drain of `receiver`.
    pub fn run(self, receiver: Arc<dyn Receiver>) -> ShutdownOutcome {
        let Self {
            signals,
            terminator,
            timeout,
            reporter,
            signalled,
        } = self;
        let (events, inbox) = mpsc::channel();
        forward_signals(signals, events.clone());

        let signal = match inbox.recv() {
            Ok(Event::Signal(signal)) => signal,
            Ok(Event::SignalsClosed | Event::Drained(_)) | Err(_) => {
                debug!(target: PROCESS_TARGET, "signal source closed");
                return ShutdownOutcome::SignalsClosed;
            }
        };
        signalled.store(true, Ordering::SeqCst);
        reporter.shutdown_requested(signal, timeout);

        thread::spawn(move || {
            let result = receiver.stop();
            // The coordinator may already have given up.
            drop(events.send(Event::Drained(result)));
        });

        let deadline = Instant::now() + timeout;
        let reason = loop {
            match inbox.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(Event::Drained(Ok(()))) => {
                    reporter.shutdown_completed();
                    return ShutdownOutcome::Drained;
                }
                Ok(Event::Drained(Err(error))) => {
                    warn!(target: PROCESS_TARGET, %error, "receiver failed to stop");
                    break format!("receiver failed to stop: {error}");
                }
                Ok(Event::Signal(signal)) => {
                    break format!("signal {signal} received while draining");
                }
                Ok(Event::SignalsClosed) => {}
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    break format!("receiver did not drain within {}s", timeout.as_secs());
                }
            }
        };
        reporter.shutdown_forced(&reason);
        terminator.terminate(FORCED_EXIT_CODE);
        ShutdownOutcome::Forced { reason }
    }
}

fn forward_signals<S: SignalSource>(mut signals: S, events: Sender<Event>) {
    thread::spawn(move || {
        loop {
            let event = signals
                .next_signal()
                .map_or(Event::SignalsClosed, Event::Signal);
            let closed = matches!(event, Event::SignalsClosed);
            if events.send(event).is_err() || closed {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::Receiver as Inbox;
    use std::sync::{Condvar, Mutex, PoisonError};

    use flex_config::ReceiverKind;
    use mockall::predicate::eq;
    use rstest::rstest;

    use super::*;
    use crate::dispatch::FlexService;
    use crate::lifecycle::StructuredLifecycleReporter;

    struct ChannelSignals(Inbox<i32>);

    impl SignalSource for ChannelSignals {
        fn next_signal(&mut self) -> Option<i32> {
            self.0.recv().ok()
        }
    }

    /// Receiver whose `stop` blocks until released.
    #[derive(Default)]
    struct GatedReceiver {
        released: Mutex<bool>,
        gate: Condvar,
    }

    impl GatedReceiver {
        fn release(&self) {
            *self.released.lock().unwrap_or_else(PoisonError::into_inner) = true;
            self.gate.notify_all();
        }
    }

    impl Receiver for GatedReceiver {
        fn kind(&self) -> ReceiverKind {
            ReceiverKind::Embedded
        }

        fn start(&self, _: Arc<FlexService>) -> Result<(), ReceiverError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), ReceiverError> {
            let released = self.released.lock().unwrap_or_else(PoisonError::into_inner);
            drop(
                self.gate
                    .wait_while(released, |released| !*released)
                    .unwrap_or_else(PoisonError::into_inner),
            );
            Ok(())
        }
    }

    fn coordinator(
        terminator: MockTerminator,
        timeout: Duration,
    ) -> (ShutdownCoordinator<ChannelSignals, MockTerminator>, Sender<i32>) {
        let (send, signals) = mpsc::channel();
        let coordinator = ShutdownCoordinator::new(
            ChannelSignals(signals),
            terminator,
            timeout,
            Arc::new(StructuredLifecycleReporter::new()),
        );
        (coordinator, send)
    }

    fn never_terminates() -> MockTerminator {
        let mut terminator = MockTerminator::new();
        terminator.expect_terminate().never();
        terminator
    }

    fn terminates_once() -> MockTerminator {
        let mut terminator = MockTerminator::new();
        terminator
            .expect_terminate()
            .with(eq(FORCED_EXIT_CODE))
            .times(1)
            .return_const(());
        terminator
    }

    #[rstest]
    fn idle_receiver_drains_cleanly() {
        let receiver = Arc::new(GatedReceiver::default());
        receiver.release();
        let (coordinator, signals) = coordinator(never_terminates(), Duration::from_secs(5));
        signals.send(SIGTERM).expect("send signal");
        let signalled = coordinator.signalled();
        assert_eq!(coordinator.run(receiver), ShutdownOutcome::Drained);
        assert!(signalled.load(Ordering::SeqCst));
    }

    #[rstest]
    fn drain_that_outlives_the_bound_is_forced() {
        let receiver = Arc::new(GatedReceiver::default());
        let (coordinator, signals) = coordinator(terminates_once(), Duration::from_millis(50));
        signals.send(SIGTERM).expect("send signal");
        let outcome = coordinator.run(Arc::clone(&receiver) as Arc<dyn Receiver>);
        receiver.release();
        assert!(matches!(outcome, ShutdownOutcome::Forced { .. }));
    }

    #[rstest]
    fn second_signal_forces_termination() {
        let receiver = Arc::new(GatedReceiver::default());
        let (coordinator, signals) = coordinator(terminates_once(), Duration::from_secs(30));
        signals.send(SIGTERM).expect("send first signal");
        signals.send(SIGINT).expect("send second signal");
        let outcome = coordinator.run(Arc::clone(&receiver) as Arc<dyn Receiver>);
        receiver.release();
        assert!(matches!(
            outcome,
            ShutdownOutcome::Forced { reason } if reason.contains("signal")
        ));
    }

    #[rstest]
    fn closed_source_leaves_the_receiver_running() {
        let receiver = Arc::new(GatedReceiver::default());
        let (coordinator, signals) = coordinator(never_terminates(), Duration::from_secs(5));
        drop(signals);
        let signalled = coordinator.signalled();
        assert_eq!(coordinator.run(receiver), ShutdownOutcome::SignalsClosed);
        assert!(!signalled.load(Ordering::SeqCst));
    }
}
