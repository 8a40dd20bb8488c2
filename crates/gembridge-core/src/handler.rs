use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{info, warn};

use gembridge_provider_core::{CallContext, ProxyResponse, UpstreamPassthroughError};

use crate::classify::{ClassifiedRequest, classify_request};
use crate::core::CoreState;
use crate::error::ProxyError;

pub async fn proxy_handler(
    State(state): State<Arc<CoreState>>,
    Path((version, path)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let trace_id = request_id(&headers).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let started_at = Instant::now();
    info!(
        event = "downstream_request",
        trace_id = %trace_id,
        method = %method,
        version = %version,
        path = %path,
        body_len = body.len()
    );

    let classified = match classify_request(&method, &version, &path, body, &state.models) {
        Ok(classified) => classified,
        Err(err) => {
            warn!(
                event = "downstream_rejected",
                trace_id = %trace_id,
                status = %err.status.as_u16(),
                path = %path
            );
            return error_response(err);
        }
    };

    let response = match classified {
        ClassifiedRequest::ModelsList { .. } => json_response(&state.models.list()),
        ClassifiedRequest::ModelsGet { request, .. } => match state.models.get(&request.path.name) {
            Some(model) => json_response(&model),
            None => error_response(ProxyError::not_found(format!(
                "model `{}` is not available",
                request.path.name
            ))),
        },
        ClassifiedRequest::Provider(request) => {
            let model = request.model().to_string();
            let ctx = CallContext::new(trace_id.clone()).with_proxy(state.proxy.clone());
            match state.provider.call(request, ctx).await {
                Ok(response) => proxy_response(response),
                Err(err) => {
                    warn!(
                        event = "provider_error",
                        trace_id = %trace_id,
                        provider = %state.provider.name(),
                        model = %model,
                        status = %err.status.as_u16()
                    );
                    passthrough_error(err)
                }
            }
        }
    };

    info!(
        event = "downstream_response",
        trace_id = %trace_id,
        status = %response.status().as_u16(),
        elapsed_ms = started_at.elapsed().as_millis()
    );
    response
}

pub async fn health_handler() -> Response {
    json_response(&serde_json::json!({ "status": "ok" }))
}

fn proxy_response(response: ProxyResponse) -> Response {
    match response {
        ProxyResponse::Json {
            status,
            headers,
            body,
        } => {
            let mut resp = Response::new(Body::from(body));
            *resp.status_mut() = status;
            resp.headers_mut().extend(headers);
            resp
        }
        ProxyResponse::Stream {
            status,
            headers,
            body,
        } => {
            let mut resp = Response::new(Body::from_stream(body.stream));
            *resp.status_mut() = status;
            resp.headers_mut().extend(headers);
            if !resp.headers().contains_key(CONTENT_TYPE) {
                resp.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(body.content_type));
            }
            resp
        }
    }
}

fn passthrough_error(err: UpstreamPassthroughError) -> Response {
    let mut resp = Response::new(Body::from(err.body));
    *resp.status_mut() = err.status;
    resp.headers_mut().extend(err.headers);
    resp
}

fn error_response(err: ProxyError) -> Response {
    let mut resp = Response::new(Body::from(err.body));
    *resp.status_mut() = err.status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

fn json_response<T: Serialize>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut resp = Response::new(Body::from(body));
            resp.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            resp
        }
        Err(err) => error_response(ProxyError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            err.to_string(),
        )),
    }
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("request-id"))
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}
