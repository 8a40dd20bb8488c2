use http::header::{CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use gembridge_provider_core::{
    CallContext, GeminiApiVersion, ProxyResponse, StreamBody, UpstreamPassthroughError,
};
use gembridge_protocol::gemini;
use gembridge_protocol::openai;
use gembridge_transform::TransformError;
use gembridge_transform::generate_content::gemini2openai_chat;

use super::plan::{TransformPlan, UpstreamRequest};
use super::stream::gemini_stream_from_openai_chat;
use super::{DispatchProvider, UpstreamMeta, UpstreamOk};

pub(super) async fn dispatch_transform<P: DispatchProvider>(
    provider: &P,
    plan: TransformPlan,
    ctx: CallContext,
) -> Result<ProxyResponse, UpstreamPassthroughError> {
    let operation = plan.operation();
    match plan {
        TransformPlan::GenerateContent { version, request } => {
            let upstream_req = translate_request(request, version, operation, &ctx)?;
            let UpstreamOk { response, .. } = provider
                .call_upstream(UpstreamRequest::OpenAIChat(upstream_req), ctx)
                .await?;
            transform_json_response(response, gemini2openai_chat::transform_response)
        }
        TransformPlan::StreamContent { version, request } => {
            let upstream_req = translate_request(request, version, operation, &ctx)?;
            let UpstreamOk { response, meta } = provider
                .call_upstream(UpstreamRequest::OpenAIChatStream(upstream_req), ctx.clone())
                .await?;
            transform_openai_chat_stream(response, meta, ctx)
        }
    }
}

fn translate_request(
    request: gemini::generate_content::request::GenerateContentRequest,
    version: GeminiApiVersion,
    operation: &'static str,
    ctx: &CallContext,
) -> Result<openai::create_chat_completions::request::CreateChatCompletionRequest, UpstreamPassthroughError>
{
    let model = request.path.model.clone();
    let contents = request.body.contents.len();
    let upstream_req = gemini2openai_chat::transform_request(request).map_err(|err| {
        warn!(
            event = "transform_request",
            trace_id = %ctx.trace_id,
            op = operation,
            version = %version,
            model = %model,
            status = "error",
            error = %err
        );
        transform_error(err)
    })?;
    info!(
        event = "transform_request",
        trace_id = %ctx.trace_id,
        op = operation,
        version = %version,
        model = %model,
        contents = contents,
        messages = upstream_req.body.messages.len(),
        tools = upstream_req.body.tools.as_ref().map_or(0, Vec::len)
    );
    Ok(upstream_req)
}

/// Schema problems are the caller's fault; malformed tool arguments in a
/// backend reply are the backend's.
pub(crate) fn transform_error(err: TransformError) -> UpstreamPassthroughError {
    match err {
        TransformError::SchemaValidation(_) => UpstreamPassthroughError::bad_request(err.to_string()),
        TransformError::InvalidToolArguments { .. } => {
            UpstreamPassthroughError::bad_gateway(err.to_string())
        }
    }
}

fn transform_json_response<T, U>(
    response: ProxyResponse,
    transform: fn(T) -> Result<U, TransformError>,
) -> Result<ProxyResponse, UpstreamPassthroughError>
where
    T: DeserializeOwned,
    U: Serialize,
{
    match response {
        ProxyResponse::Json {
            status,
            mut headers,
            body,
        } => {
            let parsed = serde_json::from_slice::<T>(&body).map_err(|err| {
                UpstreamPassthroughError::bad_gateway(format!("invalid upstream response: {err}"))
            })?;
            let mapped = transform(parsed).map_err(transform_error)?;
            let mapped_body = serde_json::to_vec(&mapped)
                .map_err(|err| UpstreamPassthroughError::bad_gateway(err.to_string()))?;
            scrub_headers(&mut headers);
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Ok(ProxyResponse::Json {
                status,
                headers,
                body: mapped_body.into(),
            })
        }
        ProxyResponse::Stream { .. } => Err(UpstreamPassthroughError::service_unavailable(
            "expected json response",
        )),
    }
}

fn transform_openai_chat_stream(
    response: ProxyResponse,
    meta: UpstreamMeta,
    ctx: CallContext,
) -> Result<ProxyResponse, UpstreamPassthroughError> {
    match response {
        ProxyResponse::Stream {
            status,
            mut headers,
            body,
        } => {
            scrub_headers(&mut headers);
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
            let stream = gemini_stream_from_openai_chat(body.stream, meta, ctx.trace_id);
            Ok(ProxyResponse::Stream {
                status,
                headers,
                body: StreamBody::new("text/event-stream", stream),
            })
        }
        ProxyResponse::Json { .. } => Err(UpstreamPassthroughError::service_unavailable(
            "expected stream response",
        )),
    }
}

fn scrub_headers(headers: &mut HeaderMap) {
    headers.remove(CONTENT_LENGTH);
    headers.remove(TRANSFER_ENCODING);
}
