//! Handler registries for the data, functions and auth domains.
//!
//! Registries are filled before the receiver starts and are only read while
//! tasks are processed. Resolving a key that nobody registered yields a
//! not-implemented handler rather than an error.

mod auth;
mod data;
mod errors;
mod functions;
mod handler;
mod operation;

pub use auth::Auth;
pub use data::{Data, ServiceObject, UNROUTABLE_MESSAGE};
pub use errors::RegistryError;
pub use functions::Functions;
pub use handler::{
    AuthHandler, AuthNotImplemented, DataHandler, FunctionHandler, NOT_IMPLEMENTED_MESSAGE,
    NotImplemented,
};
pub use operation::DataOperation;
