use flex_types::{Headers, Response, Task};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Transport-level request before normalisation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    method: String,
    path: String,
    query: Option<String>,
    headers: Headers,
    body: Vec<u8>,
}

impl InboundRequest {
    /// Creates a request for `method` on `path`.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets the raw query string (without the leading `?`).
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = (!query.is_empty()).then_some(query);
        self
    }

    /// Adds a header. Names are matched case-insensitively.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, if one was sent.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Path split on `/`, keeping the empty segment before the first slash.
    pub(crate) fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }

    /// Final path segment.
    pub(crate) fn last_segment(&self) -> &str {
        self.path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
    }
}

/// Overrides carried inside a POSTed envelope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct Locals {
    pub(crate) body: Option<Value>,
    pub(crate) hook_type: String,
    pub(crate) method: String,
    pub(crate) query: String,
    pub(crate) object_name: String,
    pub(crate) entity_id: String,
    pub(crate) temp_object_store: Map<String, Value>,
}

/// State threaded through the pipeline steps.
#[derive(Debug)]
pub(crate) struct BuildContext {
    pub(crate) inbound: InboundRequest,
    pub(crate) locals: Locals,
    pub(crate) seed_response: Response,
    pub(crate) task: Task,
}

impl BuildContext {
    /// Creates the context, seeding the response from the envelope's
    /// `response` object when the body carries one.
    pub(crate) fn new(inbound: InboundRequest) -> Self {
        let seed_response = serde_json::from_slice::<Map<String, Value>>(inbound.body())
            .ok()
            .and_then(|mut envelope| envelope.remove("response"))
            .and_then(|response| serde_json::from_value::<Response>(response).ok())
            .unwrap_or_default();
        Self {
            inbound,
            locals: Locals::default(),
            seed_response,
            task: Task::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/_flexFunctions/echo", "echo")]
    #[case("/widgets/42/", "42")]
    #[case("/", "")]
    fn last_segment(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(InboundRequest::new("GET", path).last_segment(), expected);
    }

    #[rstest]
    fn envelope_response_seeds_the_context() {
        let inbound = InboundRequest::new("POST", "/_flexFunctions/echo")
            .with_body(r#"{"response":{"status":201,"headers":{"a":"b"},"body":{"ok":true}}}"#);
        let context = BuildContext::new(inbound);
        assert_eq!(context.seed_response.status, 201);
        assert_eq!(context.seed_response.headers.get("a").map(String::as_str), Some("b"));
    }

    #[rstest]
    fn headers_are_case_insensitive() {
        let inbound = InboundRequest::new("GET", "/").with_header("X-Auth-Key", "k");
        assert_eq!(inbound.header("x-auth-key"), Some("k"));
    }
}
