use flex_types::wire::{
    API_VERSION_KEY, APP_METADATA_HEADER, AUTH_KEY_HEADER, AUTHORIZATION_KEY,
    CLIENT_APP_VERSION_KEY, COUNT_ENDPOINT, CUSTOM_ENDPOINT_HOOK, CUSTOM_REQUEST_PROPERTIES_KEY,
    ENVIRONMENT_ID_HEADER, ORIGINAL_REQUEST_HEADERS_HEADER, REQUEST_ID_HEADER,
    RESPONSE_BODY_HEADER, RESPONSE_HEADERS_HEADER, RESPONSE_STATUS_HEADER, USER_ID_HEADER,
    USERNAME_HEADER,
};
use flex_types::{AppMetadata, Body, Headers, Request, Response, TaskType};
use serde_json::{Map, Value};
use tracing::debug;

use super::PIPELINE_TARGET;
use super::context::{BuildContext, Locals};
use super::errors::PipelineError;
use super::query;

const FORWARDED_HEADER_KEYS: [&str; 4] = [
    API_VERSION_KEY,
    AUTHORIZATION_KEY,
    CLIENT_APP_VERSION_KEY,
    CUSTOM_REQUEST_PROPERTIES_KEY,
];

/// One named normalisation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    /// Decode the POSTed envelope into the override set.
    MapPostToElements,
    /// Fill identity, method, request and response from headers.
    GenerateBaseTask,
    /// Mark the task as a data task and name its service object.
    AddDataTaskAttributes,
    /// Mark the task as a functions task and name its handler.
    AddFunctionsTaskAttributes,
    /// Mark the task as an auth task and name its handler.
    AddAuthTaskAttributes,
    /// Set the entity identifier.
    AppendId,
    /// Set the query parameters.
    AppendQuery,
    /// Turn the read into a count.
    AppendCount,
    /// Set the request body.
    AppendBody,
    /// Replace the task with an empty discovery probe.
    BuildDiscoverTask,
}

impl PipelineStep {
    /// Returns the step name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MapPostToElements => "mapPostToElements",
            Self::GenerateBaseTask => "generateBaseTask",
            Self::AddDataTaskAttributes => "addDataTaskAttributes",
            Self::AddFunctionsTaskAttributes => "addFunctionsTaskAttributes",
            Self::AddAuthTaskAttributes => "addAuthTaskAttributes",
            Self::AppendId => "appendID",
            Self::AppendQuery => "appendQuery",
            Self::AppendCount => "appendCount",
            Self::AppendBody => "appendBody",
            Self::BuildDiscoverTask => "buildDiscoverTask",
        }
    }

    pub(crate) fn apply(self, context: &mut BuildContext) -> Result<(), PipelineError> {
        match self {
            Self::MapPostToElements => map_post_to_elements(context),
            Self::GenerateBaseTask => {
                generate_base_task(context);
                Ok(())
            }
            Self::AddDataTaskAttributes => {
                add_data_attributes(context);
                Ok(())
            }
            Self::AddFunctionsTaskAttributes => {
                add_handler_attributes(context, TaskType::Functions);
                Ok(())
            }
            Self::AddAuthTaskAttributes => {
                add_handler_attributes(context, TaskType::Auth);
                Ok(())
            }
            Self::AppendId => {
                append_id(context);
                Ok(())
            }
            Self::AppendQuery => append_query(context),
            Self::AppendCount => {
                context.task.endpoint = COUNT_ENDPOINT.to_owned();
                Ok(())
            }
            Self::AppendBody => {
                append_body(context);
                Ok(())
            }
            Self::BuildDiscoverTask => {
                context.task.task_type = TaskType::ServiceDiscovery;
                context.task.request = Request::default();
                context.task.response = Response::default();
                Ok(())
            }
        }
    }
}

fn map_post_to_elements(context: &mut BuildContext) -> Result<(), PipelineError> {
    let body = context.inbound.body();
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    context.locals = serde_json::from_slice::<Locals>(body)
        .map_err(|source| PipelineError::MalformedEnvelope { source })?;
    Ok(())
}

fn generate_base_task(context: &mut BuildContext) {
    let inbound = &context.inbound;
    let method = if context.locals.method.is_empty() {
        inbound.method().to_owned()
    } else {
        context.locals.method.clone()
    };

    let app_metadata = inbound
        .header(APP_METADATA_HEADER)
        .and_then(|raw| serde_json::from_str::<AppMetadata>(raw).ok())
        .unwrap_or_default();
    let headers = inbound
        .header(ORIGINAL_REQUEST_HEADERS_HEADER)
        .map(forwarded_headers)
        .unwrap_or_default();

    let task = &mut context.task;
    task.app_id = inbound.header(ENVIRONMENT_ID_HEADER).unwrap_or_default().to_owned();
    task.app_metadata = app_metadata;
    task.auth_key = inbound.header(AUTH_KEY_HEADER).unwrap_or_default().to_owned();
    task.request_id = inbound.header(REQUEST_ID_HEADER).unwrap_or_default().to_owned();
    task.method = method.to_uppercase();
    task.request = Request {
        method,
        headers,
        username: inbound.header(USERNAME_HEADER).unwrap_or_default().to_owned(),
        user_id: inbound.header(USER_ID_HEADER).unwrap_or_default().to_owned(),
        ..Request::default()
    };

    task.response = context.seed_response.clone();
    if let Some(status) = inbound
        .header(RESPONSE_STATUS_HEADER)
        .and_then(|raw| raw.trim().parse::<u16>().ok())
    {
        task.response.status = status;
    }
    if let Some(response_headers) = inbound
        .header(RESPONSE_HEADERS_HEADER)
        .and_then(|raw| serde_json::from_str::<Headers>(raw).ok())
    {
        task.response.headers = response_headers;
    }
    if let Some(raw_body) = inbound.header(RESPONSE_BODY_HEADER) {
        task.response.body = Body::from_bytes(raw_body.as_bytes());
    }
}

/// Picks the headers handlers may see out of the original-request header
/// object, lower-casing their names.
fn forwarded_headers(raw: &str) -> Headers {
    let Ok(original) = serde_json::from_str::<Map<String, Value>>(raw) else {
        debug!(target: PIPELINE_TARGET, "ignoring unreadable original request headers");
        return Headers::new();
    };
    original
        .into_iter()
        .filter_map(|(name, value)| {
            let name = name.to_ascii_lowercase();
            if !FORWARDED_HEADER_KEYS.contains(&name.as_str()) {
                return None;
            }
            let value = match value {
                Value::String(text) => text,
                Value::Null => return None,
                other => other.to_string(),
            };
            Some((name, value))
        })
        .collect()
}

fn add_data_attributes(context: &mut BuildContext) {
    let from_path = context
        .inbound
        .segments()
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned);
    context.task.task_type = TaskType::Data;
    context.task.request.service_object_name =
        from_path.unwrap_or_else(|| context.locals.object_name.clone());
}

fn add_handler_attributes(context: &mut BuildContext, task_type: TaskType) {
    let locals = &context.locals;
    let task = &mut context.task;
    task.task_type = task_type;
    task.task_name = context.inbound.last_segment().to_owned();
    if !locals.object_name.is_empty() {
        task.request.object_name = locals.object_name.clone();
    }
    task.hook_type = if locals.hook_type.is_empty() {
        CUSTOM_ENDPOINT_HOOK.to_owned()
    } else {
        locals.hook_type.clone()
    };
    task.request.hook_type = task.hook_type.clone();
    task.request.temp_object_store = locals.temp_object_store.clone();
}

/// Handler routes (`/_flexFunctions/{name}`, `/_auth/{name}`) end in a handler
/// name, so only data routes take the identifier from the path.
fn append_id(context: &mut BuildContext) {
    let handler_route = context
        .inbound
        .segments()
        .nth(1)
        .is_some_and(|segment| segment.starts_with('_'));
    let from_path = context.inbound.last_segment();
    let entity_id = if !handler_route && !from_path.is_empty() {
        from_path.to_owned()
    } else {
        context.locals.entity_id.clone()
    };
    if !entity_id.is_empty() {
        context.task.request.entity_id = entity_id;
    }
}

fn append_query(context: &mut BuildContext) -> Result<(), PipelineError> {
    if let Some(raw) = context.inbound.query() {
        context.task.request.query = query::parse_lenient(raw);
    } else if !context.locals.query.is_empty() {
        context.task.request.query = query::parse_strict(&context.locals.query)?;
    }
    Ok(())
}

fn append_body(context: &mut BuildContext) {
    context.task.request.body = match &context.locals.body {
        Some(value) if !value.is_null() => Body::from_json(value.clone()),
        _ => Body::from_bytes(context.inbound.body()),
    };
}
