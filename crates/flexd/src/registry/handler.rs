//! Handler traits, one per domain.
//!
//! Closures with the matching signature implement the traits, so most
//! services register plain functions.

use flex_types::{Body, Request, TaskOutcome};
use serde_json::json;

use crate::completion::{AuthCompletionHandler, CompletionHandler};
use crate::modules::Modules;

/// Body returned for data and functions routes nobody registered.
pub const NOT_IMPLEMENTED_MESSAGE: &str = "These methods are not implemented";

/// Handles one operation on a service object.
pub trait DataHandler: Send + Sync {
    /// Produces the outcome for `request`.
    fn handle(
        &self,
        request: &Request,
        complete: CompletionHandler,
        modules: &Modules,
    ) -> TaskOutcome;
}

impl<F> DataHandler for F
where
    F: Fn(&Request, CompletionHandler, &Modules) -> TaskOutcome + Send + Sync,
{
    fn handle(
        &self,
        request: &Request,
        complete: CompletionHandler,
        modules: &Modules,
    ) -> TaskOutcome {
        self(request, complete, modules)
    }
}

/// Handles a business-logic hook or custom endpoint.
pub trait FunctionHandler: Send + Sync {
    /// Produces the outcome for `request`.
    fn handle(
        &self,
        request: &Request,
        complete: CompletionHandler,
        modules: &Modules,
    ) -> TaskOutcome;
}

impl<F> FunctionHandler for F
where
    F: Fn(&Request, CompletionHandler, &Modules) -> TaskOutcome + Send + Sync,
{
    fn handle(
        &self,
        request: &Request,
        complete: CompletionHandler,
        modules: &Modules,
    ) -> TaskOutcome {
        self(request, complete, modules)
    }
}

/// Handles an authentication attempt.
pub trait AuthHandler: Send + Sync {
    /// Produces the outcome for `request`.
    fn handle(
        &self,
        request: &Request,
        complete: AuthCompletionHandler,
        modules: &Modules,
    ) -> TaskOutcome;
}

impl<F> AuthHandler for F
where
    F: Fn(&Request, AuthCompletionHandler, &Modules) -> TaskOutcome + Send + Sync,
{
    fn handle(
        &self,
        request: &Request,
        complete: AuthCompletionHandler,
        modules: &Modules,
    ) -> TaskOutcome {
        self(request, complete, modules)
    }
}

/// Fallback for unregistered data operations and functions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotImplemented;

impl NotImplemented {
    fn respond(complete: CompletionHandler) -> TaskOutcome {
        complete
            .set_body(Body::from_json(json!({ "message": NOT_IMPLEMENTED_MESSAGE })))
            .not_implemented()
            .done()
    }
}

impl DataHandler for NotImplemented {
    fn handle(&self, _: &Request, complete: CompletionHandler, _: &Modules) -> TaskOutcome {
        Self::respond(complete)
    }
}

impl FunctionHandler for NotImplemented {
    fn handle(&self, _: &Request, complete: CompletionHandler, _: &Modules) -> TaskOutcome {
        Self::respond(complete)
    }
}

/// Fallback for unregistered auth handlers; sets the status only.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthNotImplemented;

impl AuthHandler for AuthNotImplemented {
    fn handle(&self, _: &Request, complete: AuthCompletionHandler, _: &Modules) -> TaskOutcome {
        complete.not_implemented().done()
    }
}
