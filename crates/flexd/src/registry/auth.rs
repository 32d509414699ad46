use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use flex_types::{Task, TaskOutcome};
use tracing::debug;

use super::handler::{AuthHandler, AuthNotImplemented};
use crate::completion::AuthCompletionHandler;
use crate::dispatch::DISPATCH_TARGET;
use crate::modules::Modules;

/// Registry of authentication handlers keyed by task name.
#[derive(Default)]
pub struct Auth {
    handlers: HashMap<String, Arc<dyn AuthHandler>>,
}

impl Auth {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any previous handler.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl AuthHandler + 'static,
    ) -> &mut Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    /// Removes `name`, returning whether it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Returns the handler names in no particular order.
    #[must_use]
    pub fn handler_names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Returns true when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns true when no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Removes every handler.
    pub fn clear_all(&mut self) {
        self.handlers.clear();
    }

    /// Returns the handler for `name`, or [`AuthNotImplemented`].
    #[must_use]
    pub fn resolve(&self, name: &str) -> Arc<dyn AuthHandler> {
        self.handlers
            .get(name)
            .map_or_else(|| Arc::new(AuthNotImplemented) as Arc<dyn AuthHandler>, Arc::clone)
    }

    pub(crate) fn process(&self, task: Task, modules: &Modules) -> TaskOutcome {
        debug!(target: DISPATCH_TARGET, handler = %task.task_name, "dispatching auth task");
        let handler = self.resolve(&task.task_name);
        let request = task.request.clone();
        handler.handle(&request, AuthCompletionHandler::new(task), modules)
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("handlers", &self.handler_names())
            .finish()
    }
}
