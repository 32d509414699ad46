//! Conversion of dispatch outcomes into HTTP responses.

use axum::body::Body as HttpBody;
use axum::http::header::{CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use flex_types::wire::REQUEST_CONTINUE_HEADER;
use flex_types::{Request, Task, TaskOutcome, TaskType};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use super::super::TRANSPORT_TARGET;
use crate::pipeline::PipelineError;

/// Body of the health route.
pub(super) const HEALTHY_BODY: &str = r#"{"healthy":true}"#;

#[derive(Serialize)]
struct FunctionsReply<'a> {
    request: &'a Request,
    response: &'a flex_types::Response,
}

pub(super) fn outcome(outcome: TaskOutcome) -> Response {
    match outcome {
        TaskOutcome::Rejected { task, reason } => {
            debug!(
                target: TRANSPORT_TARGET,
                request_id = %task.request_id,
                %reason,
                "task rejected"
            );
            let mut response = Response::new(HttpBody::empty());
            if let Ok(name) = HeaderName::from_bytes(REQUEST_CONTINUE_HEADER.as_bytes()) {
                response
                    .headers_mut()
                    .insert(name, HeaderValue::from_static("true"));
            }
            response
        }
        TaskOutcome::Completed(task) => completed(&task),
    }
}

fn completed(task: &Task) -> Response {
    match task.task_type {
        TaskType::Data | TaskType::Auth => {
            let status = match task.response.status {
                0 => StatusCode::OK,
                code => StatusCode::from_u16(code).unwrap_or(StatusCode::OK),
            };
            let mut response = json_response(status, task.response.body.as_bytes().to_vec());
            for (name, value) in &task.response.headers {
                let (Ok(name), Ok(value)) = (
                    HeaderName::try_from(name.as_str()),
                    HeaderValue::try_from(value.as_str()),
                ) else {
                    warn!(target: TRANSPORT_TARGET, header = %name, "dropping invalid response header");
                    continue;
                };
                response.headers_mut().insert(name, value);
            }
            response
        }
        TaskType::Functions => serialised(&FunctionsReply {
            request: &task.request,
            response: &task.response,
        }),
        TaskType::ServiceDiscovery => {
            serialised(&task.discovery_objects.clone().unwrap_or_default())
        }
        TaskType::Logger | TaskType::ModuleGenerator | TaskType::Other(_) => {
            json_response(StatusCode::OK, Vec::new())
        }
    }
}

fn serialised(value: &impl Serialize) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(error) => {
            warn!(target: TRANSPORT_TARGET, %error, "failed to serialise reply");
            internal_error()
        }
    }
}

pub(super) fn pipeline_error(error: &PipelineError) -> Response {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    let body = json!({ "message": error.to_string() }).to_string();
    json_response(status, body.into_bytes())
}

pub(super) fn not_found() -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        json!({ "message": "Not found" }).to_string().into_bytes(),
    )
}

pub(super) fn internal_error() -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "message": "Internal error" }).to_string().into_bytes(),
    )
}

pub(super) fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = Response::new(HttpBody::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
