use flex_types::AppMetadata;

/// Application credentials taken from the task's app metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendContext {
    app_key: String,
    app_secret: String,
    master_secret: String,
}

impl BackendContext {
    pub(super) fn new(app_metadata: &AppMetadata) -> Self {
        Self {
            app_key: app_metadata.id.clone(),
            app_secret: app_metadata.app_secret.clone(),
            master_secret: app_metadata.master_secret.clone(),
        }
    }

    /// Application key.
    #[must_use]
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Application secret.
    #[must_use]
    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }

    /// Master secret.
    #[must_use]
    pub fn master_secret(&self) -> &str {
        &self.master_secret
    }
}
