//! Builders handlers use to fill in a task's response.
//!
//! A completion handler owns the task it completes. Calling `done` hands the
//! task back as a [`TaskOutcome::Completed`], so a handler cannot produce a
//! result without going through one of these builders.

use flex_types::{Body, Task, TaskOutcome};
use serde_json::{Map, Value, json};

/// Response builder for data and functions handlers.
#[derive(Debug)]
pub struct CompletionHandler {
    task: Task,
}

impl CompletionHandler {
    pub(crate) const fn new(task: Task) -> Self {
        Self { task }
    }

    /// Replaces the response body.
    #[must_use]
    pub fn set_body(mut self, body: impl Into<Body>) -> Self {
        self.task.response.body = body.into();
        self
    }

    /// Replaces the response body with a JSON value.
    #[must_use]
    pub fn set_json_body(self, value: Value) -> Self {
        self.set_body(Body::from_json(value))
    }

    /// Sets one response header, replacing any previous value.
    #[must_use]
    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.task.response.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the response status.
    #[must_use]
    pub fn set_status(mut self, status: u16) -> Self {
        self.task.response.status = status;
        self
    }

    /// 200 OK.
    #[must_use]
    pub fn ok(self) -> Self {
        self.set_status(200)
    }

    /// 201 Created.
    #[must_use]
    pub fn created(self) -> Self {
        self.set_status(201)
    }

    /// 202 Accepted.
    #[must_use]
    pub fn accepted(self) -> Self {
        self.set_status(202)
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(self) -> Self {
        self.set_status(400)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(self) -> Self {
        self.set_status(401)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(self) -> Self {
        self.set_status(403)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(self) -> Self {
        self.set_status(404)
    }

    /// 405 Method Not Allowed.
    #[must_use]
    pub fn not_allowed(self) -> Self {
        self.set_status(405)
    }

    /// 501 Not Implemented.
    #[must_use]
    pub fn not_implemented(self) -> Self {
        self.set_status(501)
    }

    /// 550, the platform's status for handler runtime errors.
    #[must_use]
    pub fn runtime_error(self) -> Self {
        self.set_status(550)
    }

    /// Returns the task being completed.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Finishes the response.
    #[must_use]
    pub fn done(self) -> TaskOutcome {
        TaskOutcome::Completed(self.task)
    }
}

/// Response builder for auth handlers.
///
/// The body is an attribute object; `set_token` stores the `token` attribute.
/// The error helpers replace the attributes with an OAuth-style error object.
#[derive(Debug)]
pub struct AuthCompletionHandler {
    task: Task,
    attributes: Map<String, Value>,
}

impl AuthCompletionHandler {
    pub(crate) fn new(task: Task) -> Self {
        let attributes = match task.response.body.json() {
            Some(Value::Object(existing)) => existing.clone(),
            _ => Map::new(),
        };
        Self { task, attributes }
    }

    /// Sets the issued token.
    #[must_use]
    pub fn set_token(self, token: impl Into<String>) -> Self {
        self.add_attribute("token", token.into())
    }

    /// Adds or replaces a response attribute.
    #[must_use]
    pub fn add_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Removes a response attribute.
    #[must_use]
    pub fn remove_attribute(mut self, key: &str) -> Self {
        self.attributes.remove(key);
        self
    }

    /// 200 OK.
    #[must_use]
    pub fn ok(mut self) -> Self {
        self.task.response.status = 200;
        self
    }

    /// 500 with a `server_error` body.
    #[must_use]
    pub fn server_error(self, description: impl Into<String>) -> Self {
        self.fail(500, "server_error", description.into())
    }

    /// 401 with an `access_denied` body.
    #[must_use]
    pub fn access_denied(self, description: impl Into<String>) -> Self {
        self.fail(401, "access_denied", description.into())
    }

    /// 503 with a `temporarily_unavailable` body.
    #[must_use]
    pub fn temporarily_unavailable(self, description: impl Into<String>) -> Self {
        self.fail(503, "temporarily_unavailable", description.into())
    }

    /// 501 Not Implemented; attributes are left untouched.
    #[must_use]
    pub fn not_implemented(mut self) -> Self {
        self.task.response.status = 501;
        self
    }

    /// Finishes the response.
    #[must_use]
    pub fn done(mut self) -> TaskOutcome {
        if !self.attributes.is_empty() {
            self.task.response.body = Body::from_json(Value::Object(self.attributes));
        }
        TaskOutcome::Completed(self.task)
    }

    fn fail(mut self, status: u16, error: &str, description: String) -> Self {
        self.task.response.status = status;
        self.attributes = match json!({ "error": error, "error_description": description }) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }
}
