use std::fmt;
use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde_json::json;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

pub struct StreamBody {
    pub content_type: &'static str,
    pub stream: ByteStream,
}

impl StreamBody {
    pub fn new<S>(content_type: &'static str, stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
    {
        Self {
            content_type,
            stream: Box::pin(stream),
        }
    }
}

impl fmt::Debug for StreamBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBody")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ProxyResponse {
    Json {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    Stream {
        status: StatusCode,
        headers: HeaderMap,
        body: StreamBody,
    },
}

impl ProxyResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyResponse::Json { status, .. } | ProxyResponse::Stream { status, .. } => *status,
        }
    }
}

/// An error response handed to the client as is: either the backend's own
/// status/headers/body, or one produced by the gateway in Gemini's error
/// shape.
#[derive(Debug, Clone)]
pub struct UpstreamPassthroughError {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamPassthroughError {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// `{"error":{"code","message","status"}}`, the shape Gemini clients parse.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": message.into(),
                "status": grpc_status(status),
            }
        });
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            status,
            headers,
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::from_status(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl fmt::Display for UpstreamPassthroughError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream error {}: {}", self.status, String::from_utf8_lossy(&self.body))
    }
}

impl std::error::Error for UpstreamPassthroughError {}

/// Canonical gRPC status name Google APIs report for an HTTP status.
pub fn grpc_status(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "INVALID_ARGUMENT",
        StatusCode::UNAUTHORIZED => "UNAUTHENTICATED",
        StatusCode::FORBIDDEN => "PERMISSION_DENIED",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => "UNIMPLEMENTED",
        StatusCode::CONFLICT => "ABORTED",
        StatusCode::TOO_MANY_REQUESTS => "RESOURCE_EXHAUSTED",
        StatusCode::INTERNAL_SERVER_ERROR => "INTERNAL",
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => "UNAVAILABLE",
        StatusCode::GATEWAY_TIMEOUT => "DEADLINE_EXCEEDED",
        _ => "UNKNOWN",
    }
}
