use std::io;

use futures_util::StreamExt;

use gembridge_provider_core::{ProxyResponse, StreamBody, UpstreamPassthroughError};

pub fn network_failure(err: wreq::Error) -> UpstreamPassthroughError {
    UpstreamPassthroughError::service_unavailable(err.to_string())
}

/// Non-2xx responses become passthrough errors carrying the backend's status,
/// headers and body untouched.
pub async fn handle_response(
    response: wreq::Response,
    is_stream: bool,
) -> Result<ProxyResponse, UpstreamPassthroughError> {
    let status = response.status();
    let headers = response.headers().clone();

    if !status.is_success() {
        let body = response.bytes().await.map_err(network_failure)?;
        return Err(UpstreamPassthroughError::new(status, headers, body));
    }

    if is_stream {
        let stream = response
            .bytes_stream()
            .map(|item| item.map_err(|err| io::Error::other(err.to_string())));
        Ok(ProxyResponse::Stream {
            status,
            headers,
            body: StreamBody::new("text/event-stream", stream),
        })
    } else {
        let body = response.bytes().await.map_err(network_failure)?;
        Ok(ProxyResponse::Json {
            status,
            headers,
            body,
        })
    }
}
