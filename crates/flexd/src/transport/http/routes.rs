//! Route table and request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use flex_types::wire::MAX_BODY_BYTES;
use percent_encoding::percent_decode_str;
use tracing::error;

use super::super::TRANSPORT_TARGET;
use super::reply;
use crate::dispatch::FlexService;
use crate::pipeline::{InboundRequest, Pipeline, PipelineError};

const SERVICE_OBJECT_PARAM: &str = "service_object";

#[derive(Clone)]
struct RouteState {
    service: Arc<FlexService>,
}

/// Builds the route table for `service`.
///
/// Handler and service-object routes answer 404 for names the service does
/// not register.
pub(crate) fn router(service: Arc<FlexService>) -> Router {
    Router::new()
        .route("/healthcheck", post(health_check))
        .route("/_command/discover", post(discover))
        .route("/_flexFunctions/{name}", post(functions))
        .route("/_auth/{name}", post(auth))
        .route(
            "/{service_object}",
            get(data).post(data).delete(data),
        )
        .route(
            "/{service_object}/{param}",
            get(data).put(data).delete(data),
        )
        .with_state(RouteState { service })
}

async fn health_check() -> Response {
    reply::json_response(StatusCode::OK, reply::HEALTHY_BODY.as_bytes().to_vec())
}

async fn discover(State(state): State<RouteState>, request: Request) -> Response {
    dispatch(state, Pipeline::discover(), request).await
}

async fn functions(
    State(state): State<RouteState>,
    Path(name): Path<String>,
    request: Request,
) -> Response {
    if !state.service.functions.contains(&name) {
        return reply::not_found();
    }
    dispatch(state, Pipeline::functions(), request).await
}

async fn auth(
    State(state): State<RouteState>,
    Path(name): Path<String>,
    request: Request,
) -> Response {
    if !state.service.auth.contains(&name) {
        return reply::not_found();
    }
    dispatch(state, Pipeline::auth(), request).await
}

async fn data(
    State(state): State<RouteState>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
) -> Response {
    let registered = params
        .get(SERVICE_OBJECT_PARAM)
        .is_some_and(|name| state.service.data.contains(name));
    if !registered {
        return reply::not_found();
    }
    let pipeline = Pipeline::data(request.method().as_str(), request.uri().path());
    dispatch(state, pipeline, request).await
}

/// Reads the request, then normalises and dispatches it on the blocking pool
/// so slow handlers do not stall the async workers.
async fn dispatch(state: RouteState, pipeline: Pipeline, request: Request) -> Response {
    let inbound = match inbound_request(request).await {
        Ok(inbound) => inbound,
        Err(error) => return reply::pipeline_error(&error),
    };
    let service = state.service;
    let joined = tokio::task::spawn_blocking(move || {
        pipeline
            .run(inbound)
            .map(|task| service.on_task_received(task))
    })
    .await;
    match joined {
        Ok(Ok(outcome)) => reply::outcome(outcome),
        Ok(Err(error)) => reply::pipeline_error(&error),
        Err(join_error) => {
            error!(
                target: TRANSPORT_TARGET,
                error = %join_error,
                "task handler did not complete"
            );
            reply::internal_error()
        }
    }
}

async fn inbound_request(request: Request) -> Result<InboundRequest, PipelineError> {
    let (parts, body) = request.into_parts();
    let path = percent_decode_str(parts.uri.path())
        .decode_utf8_lossy()
        .into_owned();
    let mut inbound = InboundRequest::new(parts.method.as_str(), path)
        .with_query(parts.uri.query().unwrap_or_default());
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            inbound = inbound.with_header(name.as_str(), value);
        }
    }
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| PipelineError::BodyTooLarge {
            limit: MAX_BODY_BYTES,
        })?;
    Ok(inbound.with_body(bytes.to_vec()))
}
