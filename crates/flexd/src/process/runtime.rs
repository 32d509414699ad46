//! Service runtime ownership and launch sequencing.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;

use flex_config::Config;
use tracing::info;

use super::errors::LaunchError;
use super::PROCESS_TARGET;
use super::shutdown::{
    ProcessTerminator, ShutdownCoordinator, ShutdownOutcome, SignalSource, SystemSignals,
    Terminator,
};
use crate::dispatch::FlexService;
use crate::lifecycle::{LifecycleReporter, StructuredLifecycleReporter};
use crate::registry::RegistryError;
use crate::telemetry;
use crate::transport::{EmbeddedEntryPoint, Receiver, ReceiverError, receiver_for};

/// Owns the configuration, the frozen service and the active receiver.
pub struct ServiceRuntime {
    config: Config,
    service: Arc<FlexService>,
    receiver: Arc<dyn Receiver>,
    reporter: Arc<dyn LifecycleReporter>,
}

impl ServiceRuntime {
    /// Freezes `service` and selects the receiver named by `config`.
    ///
    /// A configured shared secret replaces any secret already set on the
    /// service.
    #[must_use]
    pub fn init(config: Config, service: FlexService) -> Self {
        let service = match config.shared_secret() {
            Some(secret) => service.with_shared_secret(Some(secret.to_owned())),
            None => service,
        };
        let receiver = receiver_for(&config);
        Self {
            config,
            service: Arc::new(service),
            receiver,
            reporter: Arc::new(StructuredLifecycleReporter::new()),
        }
    }

    /// Replaces the lifecycle reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn LifecycleReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Returns the configuration the runtime was built from.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the shared service.
    #[must_use]
    pub fn service(&self) -> Arc<FlexService> {
        Arc::clone(&self.service)
    }

    /// Returns the active receiver.
    #[must_use]
    pub fn receiver(&self) -> Arc<dyn Receiver> {
        Arc::clone(&self.receiver)
    }

    /// Returns the host entry point when the embedded receiver is selected.
    #[must_use]
    pub fn entry_point(&self) -> Option<EmbeddedEntryPoint> {
        self.receiver.entry_point()
    }

    /// Serves tasks until [`ServiceRuntime::stop`] is called.
    ///
    /// # Errors
    ///
    /// Propagates the receiver's start failure.
    pub fn start(&self) -> Result<(), ReceiverError> {
        self.reporter.receiver_started(self.receiver.kind());
        self.receiver.start(Arc::clone(&self.service))
    }

    /// Stops the receiver, waiting for in-flight work.
    ///
    /// # Errors
    ///
    /// Propagates the receiver's stop failure.
    pub fn stop(&self) -> Result<(), ReceiverError> {
        self.receiver.stop()
    }
}

/// Process-level collaborators used while the service runs.
pub struct ProcessControl<S, T> {
    /// Source of termination signals.
    pub signals: S,
    /// Invoked when draining is abandoned.
    pub terminator: T,
    /// Lifecycle observer.
    pub reporter: Arc<dyn LifecycleReporter>,
}

/// Runs the service with production collaborators.
///
/// Configuration comes from files and `SDK_*` variables. `initialise`
/// registers handlers on an empty service before it is frozen.
///
/// # Errors
///
/// Returns a [`LaunchError`] whose [`exit_code`](LaunchError::exit_code)
/// suits the process exit status.
pub fn run<F>(initialise: F) -> Result<(), LaunchError>
where
    F: FnOnce(&mut FlexService) -> Result<(), RegistryError>,
{
    run_with_config(Config::resolve()?, initialise)
}

/// Runs the service with an already loaded configuration.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_config<F>(config: Config, initialise: F) -> Result<(), LaunchError>
where
    F: FnOnce(&mut FlexService) -> Result<(), RegistryError>,
{
    telemetry::initialise(&config)?;
    let control = ProcessControl {
        signals: SystemSignals::install()?,
        terminator: ProcessTerminator,
        reporter: Arc::new(StructuredLifecycleReporter::new()),
    };
    run_with(config, control, initialise)
}

/// Runs the service with injected collaborators.
///
/// Builds the service through `initialise`, then blocks in [`supervise`].
///
/// # Errors
///
/// Fails on registration, receiver or forced-shutdown errors.
pub fn run_with<S, T, F>(
    config: Config,
    control: ProcessControl<S, T>,
    initialise: F,
) -> Result<(), LaunchError>
where
    S: SignalSource,
    T: Terminator + 'static,
    F: FnOnce(&mut FlexService) -> Result<(), RegistryError>,
{
    control.reporter.service_starting(&config);

    let mut service = FlexService::new();
    initialise(&mut service)?;

    let runtime =
        ServiceRuntime::init(config, service).with_reporter(Arc::clone(&control.reporter));
    supervise(&runtime, control)
}

/// Serves `runtime` until its receiver stops, draining on the first signal.
///
/// When a signal triggered the stop, the coordinator's outcome decides the
/// result. A stop requested by other means returns `Ok` straight away.
///
/// # Errors
///
/// Fails on receiver or forced-shutdown errors.
pub fn supervise<S, T>(
    runtime: &ServiceRuntime,
    control: ProcessControl<S, T>,
) -> Result<(), LaunchError>
where
    S: SignalSource,
    T: Terminator + 'static,
{
    let ProcessControl {
        signals,
        terminator,
        reporter,
    } = control;
    let timeout = runtime.config().shutdown_timeout();
    let coordinator = ShutdownCoordinator::new(signals, terminator, timeout, reporter);
    let signalled = coordinator.signalled();
    let receiver = runtime.receiver();
    let supervisor = thread::Builder::new()
        .name(concat!(env!("CARGO_PKG_NAME"), "-shutdown").to_owned())
        .spawn(move || coordinator.run(receiver))
        .map_err(|source| ReceiverError::Runtime { source })?;

    runtime.start()?;

    if !signalled.load(Ordering::SeqCst) {
        info!(target: PROCESS_TARGET, "receiver stopped without a signal");
        return Ok(());
    }
    match supervisor.join() {
        Ok(ShutdownOutcome::Drained | ShutdownOutcome::SignalsClosed) => {
            info!(target: PROCESS_TARGET, "shutdown sequence completed");
            Ok(())
        }
        Ok(ShutdownOutcome::Forced { reason }) => Err(LaunchError::ForcedShutdown { reason }),
        Err(_) => Err(LaunchError::CoordinatorPanic),
    }
}
