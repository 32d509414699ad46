//! Header names and literal payloads of the platform protocol.

/// JSON-encoded application metadata.
pub const APP_METADATA_HEADER: &str = "X-Kinvey-App-Metadata";
/// JSON object carrying selected headers of the end-user request.
pub const ORIGINAL_REQUEST_HEADERS_HEADER: &str = "X-Kinvey-Original-Request-Headers";
/// Application (environment) identifier.
pub const ENVIRONMENT_ID_HEADER: &str = "X-Kinvey-Environment-Id";
/// Shared secret presented by the platform.
pub const AUTH_KEY_HEADER: &str = "X-Auth-Key";
/// Platform request identifier.
pub const REQUEST_ID_HEADER: &str = "X-Kinvey-Request-Id";
/// Authenticated username.
pub const USERNAME_HEADER: &str = "X-Kinvey-Username";
/// Authenticated user identifier.
pub const USER_ID_HEADER: &str = "X-Kinvey-User-Id";
/// Status of the response produced so far (post hooks).
pub const RESPONSE_STATUS_HEADER: &str = "X-Kinvey-Response-Status";
/// JSON object of response headers produced so far.
pub const RESPONSE_HEADERS_HEADER: &str = "X-Kinvey-Response-Headers";
/// Response body produced so far.
pub const RESPONSE_BODY_HEADER: &str = "X-Kinvey-Response-Body";
/// Set on HTTP replies to rejected tasks.
pub const REQUEST_CONTINUE_HEADER: &str = "X-Kinvey-Request-Continue";

/// Keys copied from the original request headers, lower-cased.
pub const API_VERSION_KEY: &str = "x-kinvey-api-version";
/// Authorization header key.
pub const AUTHORIZATION_KEY: &str = "authorization";
/// Client application version key.
pub const CLIENT_APP_VERSION_KEY: &str = "x-kinvey-client-app-version";
/// Custom request properties key.
pub const CUSTOM_REQUEST_PROPERTIES_KEY: &str = "x-kinvey-custom-request-properties";

/// Health probe sent over the TCP and embedded transports.
pub const HEALTH_CHECK_MESSAGE: &str = r#"{"healthCheck":1}"#;
/// Reply to [`HEALTH_CHECK_MESSAGE`].
pub const HEALTH_CHECK_REPLY: &str = r#"{"status":"ready"}"#;
/// Reply written by line-oriented transports when a task is rejected.
pub const REQUEST_CONTINUE_REPLY: &str = r#"{"requestContinue":true}"#;

/// Endpoint marker that turns a data read into a count.
pub const COUNT_ENDPOINT: &str = "_count";
/// Hook type of handlers running after the platform produced a response.
pub const POST_HOOK: &str = "post";
/// Hook type assigned when the envelope does not name one.
pub const CUSTOM_ENDPOINT_HOOK: &str = "customEndpoint";

/// Largest request body the HTTP receiver reads, in bytes.
pub const MAX_BODY_BYTES: usize = 26_214_400;
