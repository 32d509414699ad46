use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flex_types::wire::{
    API_VERSION_KEY, AUTHORIZATION_KEY, CLIENT_APP_VERSION_KEY, CUSTOM_REQUEST_PROPERTIES_KEY,
};
use flex_types::{AppMetadata, Headers, Task};
use serde_json::{Map, Value};

const DEFAULT_API_VERSION: &str = "3";
const DEFAULT_FORWARDED_PROTO: &str = "https";

/// Credential class of the end-user request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityContext {
    /// A user session or user credentials.
    User,
    /// The application key and secret.
    App,
    /// The application key and master secret.
    Master,
    /// Missing or unreadable credentials.
    Unknown,
}

impl SecurityContext {
    /// Returns the platform name, e.g. `master`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::App => "app",
            Self::Master => "master",
            Self::Unknown => "unknown",
        }
    }

    fn from_authorization(header: &str, app_metadata: &AppMetadata) -> Self {
        let Some((scheme, credentials)) = header.trim().split_once(' ') else {
            return Self::Unknown;
        };
        if scheme.eq_ignore_ascii_case("kinvey") {
            return Self::User;
        }
        if !scheme.eq_ignore_ascii_case("basic") {
            return Self::Unknown;
        }
        let Some(decoded) = STANDARD
            .decode(credentials.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        else {
            return Self::Unknown;
        };
        let Some((username, password)) = decoded.split_once(':') else {
            return Self::Unknown;
        };
        if username != app_metadata.id {
            Self::User
        } else if !password.is_empty() && password == app_metadata.master_secret {
            Self::Master
        } else if !password.is_empty() && password == app_metadata.app_secret {
            Self::App
        } else {
            Self::Unknown
        }
    }
}

/// Facts about the end-user request behind a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Authenticated username.
    pub authenticated_username: String,
    /// Authenticated user identifier.
    pub authenticated_user_id: String,
    /// API version; `3` unless the response says otherwise.
    pub api_version: String,
    /// Raw authorization header.
    pub authorization: String,
    /// Version reported by the client application.
    pub client_app_version: String,
    /// Custom properties sent by the client, empty when absent or invalid.
    pub custom_request_properties: Map<String, Value>,
    /// Platform request identifier.
    pub request_id: String,
    /// Credential class of the request.
    pub security_context: SecurityContext,
}

impl RequestMetadata {
    pub(super) fn from_task(task: &Task, app_metadata: &AppMetadata) -> Self {
        let headers = &task.request.headers;
        let authorization = header(headers, AUTHORIZATION_KEY).unwrap_or_default().to_owned();
        let custom_request_properties = header(headers, CUSTOM_REQUEST_PROPERTIES_KEY)
            .and_then(|raw| serde_json::from_str::<Map<String, Value>>(raw).ok())
            .unwrap_or_default();
        let api_version = header(&task.response.headers, API_VERSION_KEY)
            .filter(|version| !version.is_empty())
            .unwrap_or(DEFAULT_API_VERSION)
            .to_owned();
        Self {
            authenticated_username: task.request.username.clone(),
            authenticated_user_id: task.request.user_id.clone(),
            api_version,
            security_context: SecurityContext::from_authorization(&authorization, app_metadata),
            authorization,
            client_app_version: header(headers, CLIENT_APP_VERSION_KEY)
                .unwrap_or_default()
                .to_owned(),
            custom_request_properties,
            request_id: task.request_id.clone(),
        }
    }
}

/// Facts about the task itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMetadata {
    /// Task type name.
    pub task_type: String,
    /// Hook type.
    pub hook_type: String,
    /// Service object, object or collection the task concerns, in that order
    /// of preference.
    pub object_name: String,
    /// Platform target.
    pub target: String,
    /// Task identifier.
    pub task_id: String,
    /// Container identifier.
    pub container_id: String,
}

impl TaskMetadata {
    pub(super) fn from_task(task: &Task) -> Self {
        let request = &task.request;
        let object_name = [
            &request.service_object_name,
            &request.object_name,
            &request.collection_name,
        ]
        .into_iter()
        .find(|name| !name.is_empty())
        .cloned()
        .unwrap_or_default();
        Self {
            task_type: task.task_type.to_string(),
            hook_type: task.hook_type.clone(),
            object_name,
            target: task.target.clone(),
            task_id: task.task_id.clone(),
            container_id: task.container_id.clone(),
        }
    }
}

/// Chooses the backend base URL: the task's, then the app metadata's, then
/// one built from the forwarded protocol and host of the request.
pub(super) fn resolve_baas_url(task: &Task) -> String {
    if !task.baas_url.is_empty() {
        return task.baas_url.clone();
    }
    if !task.app_metadata.baas_url.is_empty() {
        return task.app_metadata.baas_url.clone();
    }
    let headers = &task.request.headers;
    let proto = header(headers, "x-forwarded-proto")
        .filter(|proto| !proto.is_empty())
        .unwrap_or(DEFAULT_FORWARDED_PROTO);
    let host = header(headers, "host").unwrap_or_default();
    format!("{proto}://{host}")
}

fn header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn app() -> AppMetadata {
        AppMetadata {
            id: "kid_app".to_owned(),
            app_secret: "app-secret".to_owned(),
            master_secret: "master-secret".to_owned(),
            ..AppMetadata::default()
        }
    }

    fn basic(credentials: &str) -> String {
        format!("Basic {}", STANDARD.encode(credentials))
    }

    #[rstest]
    #[case(basic("kid_app:master-secret"), SecurityContext::Master)]
    #[case(basic("kid_app:app-secret"), SecurityContext::App)]
    #[case(basic("alice:hunter2"), SecurityContext::User)]
    #[case(basic("kid_app:wrong"), SecurityContext::Unknown)]
    #[case("Kinvey session-token".to_owned(), SecurityContext::User)]
    #[case("Basic !!!".to_owned(), SecurityContext::Unknown)]
    #[case(String::new(), SecurityContext::Unknown)]
    fn security_context_from_authorization(
        app: AppMetadata,
        #[case] header: String,
        #[case] expected: SecurityContext,
    ) {
        assert_eq!(SecurityContext::from_authorization(&header, &app), expected);
    }

    #[rstest]
    fn baas_url_prefers_task_then_metadata_then_headers() {
        let mut task = Task::default();
        task.request.headers.insert("Host".to_owned(), "baas.example".to_owned());
        assert_eq!(resolve_baas_url(&task), "https://baas.example");

        task.request
            .headers
            .insert("x-forwarded-proto".to_owned(), "http".to_owned());
        assert_eq!(resolve_baas_url(&task), "http://baas.example");

        task.app_metadata.baas_url = "https://from-metadata".to_owned();
        assert_eq!(resolve_baas_url(&task), "https://from-metadata");

        task.baas_url = "https://from-task".to_owned();
        assert_eq!(resolve_baas_url(&task), "https://from-task");
    }

    #[rstest]
    fn request_metadata_reads_headers(app: AppMetadata) {
        let mut task = Task {
            request_id: "req-1".to_owned(),
            ..Task::default()
        };
        task.request.headers.insert(
            "X-Kinvey-Custom-Request-Properties".to_owned(),
            r#"{"region":"eu"}"#.to_owned(),
        );
        task.request
            .headers
            .insert("x-kinvey-client-app-version".to_owned(), "1.2".to_owned());
        task.response
            .headers
            .insert("x-kinvey-api-version".to_owned(), "5".to_owned());

        let metadata = RequestMetadata::from_task(&task, &app);
        assert_eq!(metadata.api_version, "5");
        assert_eq!(metadata.client_app_version, "1.2");
        assert_eq!(
            metadata.custom_request_properties.get("region"),
            Some(&Value::from("eu"))
        );
        assert_eq!(metadata.request_id, "req-1");
        assert_eq!(metadata.security_context, SecurityContext::Unknown);
    }

    #[rstest]
    fn api_version_defaults_to_three(app: AppMetadata) {
        let metadata = RequestMetadata::from_task(&Task::default(), &app);
        assert_eq!(metadata.api_version, "3");
    }
}
