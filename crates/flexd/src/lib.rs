//! Task reception and dispatch engine for Flex services.
//!
//! A service registers data, functions and auth handlers on a
//! [`FlexService`], then hands it to a receiver selected by
//! [`flex_config::Config`]. The HTTP receiver normalises requests through a
//! [`Pipeline`] of named steps; the TCP and embedded receivers accept tasks
//! that are already normalised. Every receiver funnels tasks into
//! [`FlexService::on_task_received`], which enforces the shared secret and
//! routes the task to the matching registry.
//!
//! [`run`] wires the pieces together for a standalone process: it loads
//! configuration, installs telemetry, lets the caller register handlers and
//! serves until a termination signal drains the receiver.

mod completion;
mod dispatch;
mod lifecycle;
pub mod modules;
mod pipeline;
mod process;
pub mod registry;
mod telemetry;
mod transport;

pub use completion::{AuthCompletionHandler, CompletionHandler};
pub use dispatch::{FlexService, SDK_VERSION};
pub use lifecycle::{LifecycleReporter, StructuredLifecycleReporter};
pub use modules::Modules;
pub use pipeline::{InboundRequest, Pipeline, PipelineError, PipelineStep};
pub use process::{
    FORCED_EXIT_CODE, LaunchError, ProcessControl, ProcessTerminator, ServiceRuntime,
    ShutdownCoordinator, ShutdownError, ShutdownOutcome, SignalSource, SystemSignals, Terminator,
    run, run_with, run_with_config, supervise,
};
pub use registry::{Auth, Data, DataOperation, Functions, RegistryError};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};
pub use transport::{
    EmbeddedEntryPoint, EmbeddedReceiver, HttpReceiver, Receiver, ReceiverError, TcpReceiver,
    receiver_for,
};

#[cfg(test)]
mod tests;
