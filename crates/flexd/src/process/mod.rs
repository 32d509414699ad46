//! Process supervision: launching the runtime and bounded shutdown.

mod errors;
mod runtime;
mod shutdown;

pub use errors::LaunchError;
pub use runtime::{ProcessControl, ServiceRuntime, run, run_with, run_with_config, supervise};
pub use shutdown::{
    ProcessTerminator, ShutdownCoordinator, ShutdownError, ShutdownOutcome, SignalSource,
    SystemSignals, Terminator,
};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Exit code passed to the [`Terminator`] when draining is abandoned.
pub const FORCED_EXIT_CODE: i32 = 1;
