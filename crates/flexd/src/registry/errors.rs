use thiserror::Error;

/// Errors returned to callers registering handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A service object name was empty.
    #[error("service object name must not be empty")]
    EmptyServiceObjectName,
    /// An operation key was empty.
    #[error("operation name must not be empty")]
    EmptyOperation,
    /// An operation key did not name a data operation.
    #[error("unknown data operation '{operation}'")]
    UnknownOperation {
        /// Key as supplied.
        operation: String,
    },
}
