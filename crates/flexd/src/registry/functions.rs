use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use flex_types::wire::POST_HOOK;
use flex_types::{Request, Task, TaskOutcome};
use tracing::debug;

use super::handler::{FunctionHandler, NotImplemented};
use crate::completion::CompletionHandler;
use crate::dispatch::DISPATCH_TARGET;
use crate::modules::Modules;

/// Registry of business-logic handlers keyed by task name.
#[derive(Default)]
pub struct Functions {
    handlers: HashMap<String, Arc<dyn FunctionHandler>>,
}

impl Functions {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any previous handler.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl FunctionHandler + 'static,
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

    /// Returns the handler for `name`, or [`NotImplemented`].
    #[must_use]
    pub fn resolve(&self, name: &str) -> Arc<dyn FunctionHandler> {
        self.handlers
            .get(name)
            .map_or_else(|| Arc::new(NotImplemented) as Arc<dyn FunctionHandler>, Arc::clone)
    }

    pub(crate) fn process(&self, task: Task, modules: &Modules) -> TaskOutcome {
        debug!(
            target: DISPATCH_TARGET,
            handler = %task.task_name,
            hook_type = %task.hook_type,
            "dispatching functions task"
        );
        let handler = self.resolve(&task.task_name);
        let request = handler_request(&task);
        handler.handle(&request, CompletionHandler::new(task), modules)
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Functions")
            .field("handlers", &self.handler_names())
            .finish()
    }
}

/// Builds the request a function handler sees.
///
/// Post hooks observe the headers of the response produced so far; every
/// other hook observes the request headers.
fn handler_request(task: &Task) -> Request {
    let source = &task.request;
    let headers = if task.hook_type == POST_HOOK {
        task.response.headers.clone()
    } else {
        source.headers.clone()
    };
    let object_name = if source.object_name.is_empty() {
        source.collection_name.clone()
    } else {
        source.object_name.clone()
    };
    Request {
        body: source.body.clone(),
        entity_id: source.entity_id.clone(),
        headers,
        hook_type: task.hook_type.clone(),
        method: source.method.clone(),
        object_name,
        query: source.query.clone(),
        temp_object_store: source.temp_object_store.clone(),
        user_id: source.user_id.clone(),
        username: source.username.clone(),
        ..Request::default()
    }
}

#[cfg(test)]
mod tests {
    use flex_types::TaskType;
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    fn echo_request() -> impl FunctionHandler {
        |request: &Request, complete: CompletionHandler, _: &Modules| {
            let view = serde_json::to_value(request).unwrap_or_default();
            complete.set_body(view).ok().done()
        }
    }

    fn functions_task(name: &str) -> Task {
        Task {
            task_type: TaskType::Functions,
            task_name: name.to_owned(),
            ..Task::default()
        }
    }

    #[fixture]
    fn registry() -> Functions {
        let mut functions = Functions::new();
        functions.register("echo", echo_request());
        functions
    }

    fn run(registry: &Functions, task: Task) -> Task {
        let modules = Modules::for_task(&task);
        registry
            .process(task, &modules)
            .into_completed()
            .expect("functions tasks complete")
    }

    #[rstest]
    fn post_hooks_see_response_headers(registry: Functions) {
        let mut task = functions_task("echo");
        task.hook_type = "post".to_owned();
        task.request.headers.insert("source".to_owned(), "request".to_owned());
        task.response.headers.insert("source".to_owned(), "response".to_owned());

        let completed = run(&registry, task);
        let view = completed.response.body.json().cloned().unwrap_or_default();
        assert_eq!(view["headers"], json!({"source": "response"}));
        assert_eq!(view["hookType"], json!("post"));
    }

    #[rstest]
    fn pre_hooks_see_request_headers(registry: Functions) {
        let mut task = functions_task("echo");
        task.hook_type = "pre".to_owned();
        task.request.headers.insert("source".to_owned(), "request".to_owned());

        let completed = run(&registry, task);
        let view = completed.response.body.json().cloned().unwrap_or_default();
        assert_eq!(view["headers"], json!({"source": "request"}));
    }

    #[rstest]
    #[case("widget", "collection", "widget")]
    #[case("", "collection", "collection")]
    fn object_name_prefers_the_object(
        registry: Functions,
        #[case] object_name: &str,
        #[case] collection_name: &str,
        #[case] expected: &str,
    ) {
        let mut task = functions_task("echo");
        task.request.object_name = object_name.to_owned();
        task.request.collection_name = collection_name.to_owned();
        task.request.entity_id = "e1".to_owned();

        let completed = run(&registry, task);
        let view = completed.response.body.json().cloned().unwrap_or_default();
        assert_eq!(view["objectName"], json!(expected));
        assert_eq!(view["entityId"], json!("e1"));
    }

    #[rstest]
    fn unknown_handler_is_not_implemented(registry: Functions) {
        let completed = run(&registry, functions_task("missing"));
        assert_eq!(completed.response.status, 501);
        assert_eq!(
            completed.response.body.json(),
            Some(&json!({"message": "These methods are not implemented"}))
        );
    }

    #[rstest]
    fn registering_twice_keeps_one_entry(mut registry: Functions) {
        registry.register("echo", echo_request());
        assert_eq!(registry.handler_names(), vec!["echo".to_owned()]);
        registry.clear_all();
        assert!(registry.is_empty());
    }
}
