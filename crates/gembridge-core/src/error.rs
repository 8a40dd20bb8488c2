use bytes::Bytes;
use http::StatusCode;
use serde_json::json;

use gembridge_provider_core::grpc_status;

/// A request the gateway refuses before any provider sees it.
#[derive(Debug, Clone)]
pub struct ProxyError {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ProxyError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": message.into(),
                "status": grpc_status(status),
            }
        });
        Self {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, message)
    }
}
