use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::body::Body;
use crate::discovery::DiscoveryManifest;

/// Header map carried by requests and responses.
pub type Headers = BTreeMap<String, String>;

/// Parsed query string: each key maps to every value supplied for it.
pub type QueryParams = BTreeMap<String, Vec<String>>;

/// Kind of work a task represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    /// CRUD operation on a service object.
    Data,
    /// Business-logic hook or custom endpoint.
    Functions,
    /// Authentication attempt.
    Auth,
    /// Probe for the registered handlers.
    ServiceDiscovery,
    /// Log forwarding; accepted without a secret but never dispatched.
    Logger,
    /// Module generation; accepted without a secret but never dispatched.
    ModuleGenerator,
    /// Any other value, kept verbatim.
    Other(String),
}

impl TaskType {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Data => "data",
            Self::Functions => "functions",
            Self::Auth => "auth",
            Self::ServiceDiscovery => "serviceDiscovery",
            Self::Logger => "logger",
            Self::ModuleGenerator => "moduleGenerator",
            Self::Other(value) => value,
        }
    }

    /// Returns true for task types accepted without the shared secret.
    #[must_use]
    pub const fn skips_secret_check(&self) -> bool {
        matches!(
            self,
            Self::ServiceDiscovery | Self::Logger | Self::ModuleGenerator
        )
    }

    /// Returns true for task types the dispatcher knows how to process.
    #[must_use]
    pub const fn is_dispatchable(&self) -> bool {
        matches!(
            self,
            Self::Data | Self::Functions | Self::Auth | Self::ServiceDiscovery
        )
    }
}

impl Default for TaskType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "data" => Self::Data,
            "functions" => Self::Functions,
            "auth" => Self::Auth,
            "serviceDiscovery" => Self::ServiceDiscovery,
            "logger" => Self::Logger,
            "moduleGenerator" => Self::ModuleGenerator,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for TaskType {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<TaskType> for String {
    fn from(value: TaskType) -> Self {
        match value {
            TaskType::Other(value) => value,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application metadata forwarded by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application identifier.
    #[serde(rename = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Parent application identifier.
    #[serde(rename = "applicationId", skip_serializing_if = "String::is_empty")]
    pub application_id: String,
    /// Application secret.
    #[serde(rename = "appsecret", skip_serializing_if = "String::is_empty")]
    pub app_secret: String,
    /// Backend base URL.
    #[serde(rename = "bassUrl", alias = "baasUrl", skip_serializing_if = "String::is_empty")]
    pub baas_url: String,
    /// Master secret.
    #[serde(rename = "mastersecret", skip_serializing_if = "String::is_empty")]
    pub master_secret: String,
    /// Display name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Remaining fields (business-logic flags, maintenance state), kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// End-user request embedded in a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Request {
    /// Request payload.
    #[serde(skip_serializing_if = "Body::is_empty")]
    pub body: Body,
    /// Collection the request targets.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub collection_name: String,
    /// Entity identifier; empty when the request is not about one entity.
    #[serde(alias = "EntityID", skip_serializing_if = "String::is_empty")]
    pub entity_id: String,
    /// Selected request headers, lower-cased.
    pub headers: Headers,
    /// Hook type seen by the handler.
    #[serde(alias = "HookType", skip_serializing_if = "String::is_empty")]
    pub hook_type: String,
    /// HTTP method of the end-user request.
    pub method: String,
    /// Object name of a business-logic hook.
    #[serde(alias = "ObjectName", skip_serializing_if = "String::is_empty")]
    pub object_name: String,
    /// Service object a data task targets.
    #[serde(alias = "ServiceObjectName", skip_serializing_if = "String::is_empty")]
    pub service_object_name: String,
    /// Scratch values shared between hooks of one request.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub temp_object_store: Map<String, Value>,
    /// Authenticated user identifier.
    #[serde(alias = "UserID", skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    /// Authenticated username.
    pub username: String,
    /// Query parameters.
    #[serde(alias = "Query", skip_serializing_if = "QueryParams::is_empty")]
    pub query: QueryParams,
}

/// Response produced so far, and the slot handlers write their result into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    /// Response payload.
    #[serde(skip_serializing_if = "Body::is_empty")]
    pub body: Body,
    /// Response headers.
    pub headers: Headers,
    /// HTTP status; zero until someone sets it.
    pub status: u16,
}

/// Canonical unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Task {
    /// Application identifier.
    pub app_id: String,
    /// Application metadata.
    pub app_metadata: AppMetadata,
    /// Shared secret presented by the platform.
    pub auth_key: String,
    /// Backend base URL supplied with the task.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub baas_url: String,
    /// Identifier of the container executing the task.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub container_id: String,
    /// Manifest attached to service-discovery results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_objects: Option<DiscoveryManifest>,
    /// Data endpoint marker, `_count` for count queries.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    /// Hook type: `pre`, `post` or `customEndpoint`.
    pub hook_type: String,
    /// Upper-cased HTTP method.
    pub method: String,
    /// Object name for hooks.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub object_name: String,
    /// End-user request.
    pub request: Request,
    /// Platform request identifier.
    pub request_id: String,
    /// Response slot.
    pub response: Response,
    /// Version of the service library that produced the result.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sdk_version: String,
    /// Platform target.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target: String,
    /// Task identifier.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub task_id: String,
    /// Handler name for functions and auth tasks.
    pub task_name: String,
    /// Kind of work.
    pub task_type: TaskType,
}

impl Task {
    /// Parses one JSON-encoded task.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when `bytes` is not a task envelope.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Returns true when the request carries an entity identifier.
    #[must_use]
    pub fn has_entity_id(&self) -> bool {
        !self.request.entity_id.is_empty()
    }

    /// Returns true when the request carries query parameters.
    #[must_use]
    pub fn has_query(&self) -> bool {
        !self.request.query.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn platform_envelope_decodes() {
        let envelope = json!({
            "appId": "kid_123",
            "authKey": "secret",
            "taskType": "data",
            "method": "GET",
            "appMetadata": {"_id": "kid_123", "bassUrl": "https://baas", "blFlags": {}},
            "request": {
                "method": "GET",
                "serviceObjectName": "widgets",
                "entityId": "42",
                "headers": {"authorization": "Basic abc"},
                "body": {"a": 1},
                "query": {"limit": ["10"]}
            },
            "response": {"status": 0, "headers": {}}
        });
        let task: Task = serde_json::from_value(envelope).expect("decode task");

        assert_eq!(task.task_type, TaskType::Data);
        assert_eq!(task.app_metadata.baas_url, "https://baas");
        assert!(task.app_metadata.extra.contains_key("blFlags"));
        assert_eq!(task.request.service_object_name, "widgets");
        assert!(task.has_entity_id());
        assert!(task.has_query());
        assert_eq!(task.request.body.json(), Some(&json!({"a": 1})));
    }

    #[rstest]
    fn legacy_field_spellings_are_accepted() {
        let task: Task = serde_json::from_value(json!({
            "request": {"EntityID": "7", "ServiceObjectName": "widgets"}
        }))
        .expect("decode task");
        assert_eq!(task.request.entity_id, "7");
        assert_eq!(task.request.service_object_name, "widgets");
    }

    #[rstest]
    #[case("serviceDiscovery", true, true)]
    #[case("logger", true, false)]
    #[case("moduleGenerator", true, false)]
    #[case("data", false, true)]
    #[case("bogus", false, false)]
    fn task_type_classification(
        #[case] name: &str,
        #[case] skips_secret: bool,
        #[case] dispatchable: bool,
    ) {
        let task_type = TaskType::from(name);
        assert_eq!(task_type.skips_secret_check(), skips_secret);
        assert_eq!(task_type.is_dispatchable(), dispatchable);
        assert_eq!(task_type.as_str(), name);
    }
}
