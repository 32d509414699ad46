//! Per-task helper context handed to every handler.
//!
//! Built from the task alone; nothing here performs I/O.

mod backend;
mod logger;
mod metadata;
mod store;

use flex_types::{AppMetadata, Task};

pub use backend::BackendContext;
pub use logger::Logger;
pub use metadata::{RequestMetadata, SecurityContext, TaskMetadata};
pub use store::TempObjectStore;

/// Helpers available to a handler while it processes one task.
#[derive(Debug)]
pub struct Modules {
    app_metadata: AppMetadata,
    backend_context: BackendContext,
    request_metadata: RequestMetadata,
    task_metadata: TaskMetadata,
    temp_object_store: TempObjectStore,
    logger: Logger,
}

impl Modules {
    /// Builds the modules for `task`.
    #[must_use]
    pub fn for_task(task: &Task) -> Self {
        let mut app_metadata = task.app_metadata.clone();
        app_metadata.baas_url = metadata::resolve_baas_url(task);
        let request_metadata = RequestMetadata::from_task(task, &app_metadata);
        Self {
            backend_context: BackendContext::new(&app_metadata),
            request_metadata,
            task_metadata: TaskMetadata::from_task(task),
            temp_object_store: TempObjectStore::seeded(task.request.temp_object_store.clone()),
            logger: Logger::new(),
            app_metadata,
        }
    }

    /// Application metadata with the backend base URL resolved.
    #[must_use]
    pub const fn app_metadata(&self) -> &AppMetadata {
        &self.app_metadata
    }

    /// Application credentials.
    #[must_use]
    pub const fn backend_context(&self) -> &BackendContext {
        &self.backend_context
    }

    /// Facts about the end-user request.
    #[must_use]
    pub const fn request_metadata(&self) -> &RequestMetadata {
        &self.request_metadata
    }

    /// Facts about the task.
    #[must_use]
    pub const fn task_metadata(&self) -> &TaskMetadata {
        &self.task_metadata
    }

    /// Scratch store shared by the handler's code for this task.
    #[must_use]
    pub const fn temp_object_store(&self) -> &TempObjectStore {
        &self.temp_object_store
    }

    /// Handler logger.
    #[must_use]
    pub const fn logger(&self) -> &Logger {
        &self.logger
    }
}
