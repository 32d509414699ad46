use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use flex_types::{Body, Task, TaskOutcome};
use serde_json::json;
use tracing::debug;

use super::errors::RegistryError;
use super::handler::{DataHandler, NotImplemented};
use super::operation::DataOperation;
use crate::completion::CompletionHandler;
use crate::dispatch::DISPATCH_TARGET;
use crate::modules::Modules;

/// Body of the reply when a data task's method maps to no operation.
pub const UNROUTABLE_MESSAGE: &str = "Cannot determine data operation";

/// Named collection and the operations registered for it.
pub struct ServiceObject {
    name: String,
    handlers: HashMap<DataOperation, Arc<dyn DataHandler>>,
}

impl ServiceObject {
    fn new(name: String) -> Self {
        Self {
            name,
            handlers: HashMap::new(),
        }
    }

    /// Returns the service object's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `handler` for `operation`, replacing any previous handler.
    pub fn on(&mut self, operation: DataOperation, handler: impl DataHandler + 'static) -> &mut Self {
        self.handlers.insert(operation, Arc::new(handler));
        self
    }

    /// Registers a handler by its key, e.g. `"onGetByID"`.
    ///
    /// # Errors
    ///
    /// Fails when `key` is empty or names no operation.
    pub fn register(
        &mut self,
        key: &str,
        handler: impl DataHandler + 'static,
    ) -> Result<&mut Self, RegistryError> {
        if key.is_empty() {
            return Err(RegistryError::EmptyOperation);
        }
        let operation = DataOperation::parse(key).ok_or_else(|| RegistryError::UnknownOperation {
            operation: key.to_owned(),
        })?;
        Ok(self.on(operation, handler))
    }

    /// Registers the `onInsert` handler.
    pub fn on_insert(&mut self, handler: impl DataHandler + 'static) -> &mut Self {
        self.on(DataOperation::Insert, handler)
    }

    /// Registers the `onUpdate` handler.
    pub fn on_update(&mut self, handler: impl DataHandler + 'static) -> &mut Self {
        self.on(DataOperation::Update, handler)
    }

    /// Registers the `onGetAll` handler.
    pub fn on_get_all(&mut self, handler: impl DataHandler + 'static) -> &mut Self {
        self.on(DataOperation::GetAll, handler)
    }

    /// Registers the `onGetByID` handler.
    pub fn on_get_by_id(&mut self, handler: impl DataHandler + 'static) -> &mut Self {
        self.on(DataOperation::GetById, handler)
    }

    /// Registers the `onGetByQuery` handler.
    pub fn on_get_by_query(&mut self, handler: impl DataHandler + 'static) -> &mut Self {
        self.on(DataOperation::GetByQuery, handler)
    }

    /// Registers the `onGetCount` handler.
    pub fn on_get_count(&mut self, handler: impl DataHandler + 'static) -> &mut Self {
        self.on(DataOperation::GetCount, handler)
    }

    /// Registers the `onGetCountByQuery` handler.
    pub fn on_get_count_by_query(&mut self, handler: impl DataHandler + 'static) -> &mut Self {
        self.on(DataOperation::GetCountByQuery, handler)
    }

    /// Registers the `onDeleteAll` handler.
    pub fn on_delete_all(&mut self, handler: impl DataHandler + 'static) -> &mut Self {
        self.on(DataOperation::DeleteAll, handler)
    }

    /// Registers the `onDeleteByID` handler.
    pub fn on_delete_by_id(&mut self, handler: impl DataHandler + 'static) -> &mut Self {
        self.on(DataOperation::DeleteById, handler)
    }

    /// Registers the `onDeleteByQuery` handler.
    pub fn on_delete_by_query(&mut self, handler: impl DataHandler + 'static) -> &mut Self {
        self.on(DataOperation::DeleteByQuery, handler)
    }

    /// Removes the handler for `operation`, returning whether one existed.
    pub fn unregister(&mut self, operation: DataOperation) -> bool {
        self.handlers.remove(&operation).is_some()
    }

    /// Returns the registered operations.
    #[must_use]
    pub fn operations(&self) -> Vec<DataOperation> {
        self.handlers.keys().copied().collect()
    }

    /// Returns the handler for `operation`, or [`NotImplemented`].
    #[must_use]
    pub fn resolve(&self, operation: DataOperation) -> Arc<dyn DataHandler> {
        self.handlers
            .get(&operation)
            .map_or_else(|| Arc::new(NotImplemented) as Arc<dyn DataHandler>, Arc::clone)
    }
}

impl fmt::Debug for ServiceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceObject")
            .field("name", &self.name)
            .field("operations", &self.operations())
            .finish()
    }
}

/// Registry of service objects.
#[derive(Debug, Default)]
pub struct Data {
    service_objects: HashMap<String, ServiceObject>,
}

impl Data {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `name`, discarding any handlers it already had.
    pub fn new_service_object(&mut self, name: impl Into<String>) -> &mut ServiceObject {
        let name = name.into();
        self.service_objects.remove(&name);
        self.service_object(name)
    }

    /// Returns `name`, creating it on first access.
    pub fn service_object(&mut self, name: impl Into<String>) -> &mut ServiceObject {
        let name = name.into();
        self.service_objects
            .entry(name.clone())
            .or_insert_with(|| ServiceObject::new(name))
    }

    /// Removes `name`, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Fails when `name` is empty.
    pub fn remove_service_object(&mut self, name: &str) -> Result<bool, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyServiceObjectName);
        }
        Ok(self.service_objects.remove(name).is_some())
    }

    /// Returns the service object names in no particular order.
    #[must_use]
    pub fn service_object_names(&self) -> Vec<String> {
        self.service_objects.keys().cloned().collect()
    }

    /// Returns true when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.service_objects.contains_key(name)
    }

    /// Returns true when no service object is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.service_objects.is_empty()
    }

    /// Removes every service object.
    pub fn clear_all(&mut self) {
        self.service_objects.clear();
    }

    /// Returns the handler for `operation` on `name`, or [`NotImplemented`].
    ///
    /// Lookup never creates a service object.
    #[must_use]
    pub fn resolve(&self, name: &str, operation: DataOperation) -> Arc<dyn DataHandler> {
        self.service_objects.get(name).map_or_else(
            || Arc::new(NotImplemented) as Arc<dyn DataHandler>,
            |service_object| service_object.resolve(operation),
        )
    }

    pub(crate) fn process(&self, task: Task, modules: &Modules) -> TaskOutcome {
        let Some(operation) = DataOperation::route(
            &task.method,
            &task.endpoint,
            task.has_entity_id(),
            task.has_query(),
        ) else {
            debug!(
                target: DISPATCH_TARGET,
                method = %task.method,
                service_object = %task.request.service_object_name,
                "data task has no routable operation"
            );
            return CompletionHandler::new(task)
                .set_body(Body::from_json(json!({ "message": UNROUTABLE_MESSAGE })))
                .bad_request()
                .done();
        };

        debug!(
            target: DISPATCH_TARGET,
            service_object = %task.request.service_object_name,
            operation = %operation,
            "dispatching data task"
        );
        let handler = self.resolve(&task.request.service_object_name, operation);
        let request = task.request.clone();
        handler.handle(&request, CompletionHandler::new(task), modules)
    }
}
