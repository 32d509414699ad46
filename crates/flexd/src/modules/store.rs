use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};

/// Key/value scratch space scoped to one task.
#[derive(Debug, Default)]
pub struct TempObjectStore {
    values: Mutex<Map<String, Value>>,
}

impl TempObjectStore {
    pub(super) fn seeded(values: Map<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    /// Stores `value` under `key` and returns it.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Value {
        let value = value.into();
        self.lock().insert(key.into(), value.clone());
        value
    }

    /// Returns the value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Returns a snapshot of every value.
    #[must_use]
    pub fn get_all(&self) -> Map<String, Value> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Map<String, Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
