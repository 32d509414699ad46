//! Wire types shared by the Flex receivers and dispatcher.
//!
//! Every transport converges on [`Task`], the platform's JSON envelope for a
//! single unit of work. Dispatch produces a [`TaskOutcome`], which the
//! transport turns back into bytes.

mod body;
mod discovery;
mod outcome;
mod task;
pub mod wire;

pub use body::Body;
pub use discovery::{AuthHandlers, BusinessLogic, DataLink, DiscoveryManifest};
pub use outcome::{RejectReason, TaskOutcome};
pub use task::{AppMetadata, Headers, QueryParams, Request, Response, Task, TaskType};
