use std::time::{Duration, Instant};

use async_trait::async_trait;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::{info, warn};

use gembridge_provider_core::{
    CallContext, Provider, ProxyRequest, ProxyResponse, UpstreamPassthroughError,
};
use gembridge_protocol::openai;

use crate::client::shared_client;
use crate::dispatch::{DispatchProvider, UpstreamMeta, UpstreamOk, UpstreamRequest, dispatch_request};
use crate::upstream::{handle_response, network_failure};

pub const PROVIDER_NAME: &str = "copilot";
pub const DEFAULT_BASE_URL: &str = "https://api.githubcopilot.com";
pub const DEFAULT_INTEGRATION_ID: &str = "vscode-chat";
pub const DEFAULT_EDITOR_VERSION: &str = "vscode/1.99.0";

const COPILOT_INTEGRATION_ID: HeaderName = HeaderName::from_static("copilot-integration-id");
const EDITOR_VERSION: HeaderName = HeaderName::from_static("editor-version");

#[derive(Debug, Clone)]
pub struct CopilotConfig {
    pub base_url: String,
    /// Copilot API token, sent as a bearer credential.
    pub token: String,
    pub integration_id: String,
    pub editor_version: String,
    pub timeout: Duration,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            integration_id: DEFAULT_INTEGRATION_ID.to_string(),
            editor_version: DEFAULT_EDITOR_VERSION.to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

/// GitHub Copilot's chat-completions endpoint. Gemini requests are
/// translated before they reach it.
#[derive(Debug)]
pub struct CopilotProvider {
    config: CopilotConfig,
}

impl CopilotProvider {
    pub fn new(config: CopilotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CopilotConfig {
        &self.config
    }
}

#[async_trait]
impl Provider for CopilotProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn call(
        &self,
        req: ProxyRequest,
        ctx: CallContext,
    ) -> Result<ProxyResponse, UpstreamPassthroughError> {
        dispatch_request(self, req, ctx).await
    }
}

#[async_trait]
impl DispatchProvider for CopilotProvider {
    async fn call_upstream(
        &self,
        req: UpstreamRequest,
        ctx: CallContext,
    ) -> Result<UpstreamOk, UpstreamPassthroughError> {
        match req {
            UpstreamRequest::OpenAIChat(request) => self.handle_openai_chat(request, false, ctx).await,
            UpstreamRequest::OpenAIChatStream(request) => {
                self.handle_openai_chat(request, true, ctx).await
            }
        }
    }
}

impl CopilotProvider {
    async fn handle_openai_chat(
        &self,
        request: openai::create_chat_completions::request::CreateChatCompletionRequest,
        is_stream: bool,
        ctx: CallContext,
    ) -> Result<UpstreamOk, UpstreamPassthroughError> {
        let model = request.body.model.clone();
        let body = prepare_chat_body(request.body, is_stream);

        let path = "/chat/completions";
        let url = build_url(&self.config.base_url, path);
        let client = shared_client(ctx.proxy.as_deref(), self.config.timeout)?;
        let req_headers = build_copilot_headers(&self.config, is_stream)?;
        let started_at = Instant::now();
        info!(
            event = "upstream_request",
            trace_id = %ctx.trace_id,
            provider = %PROVIDER_NAME,
            op = "openai.chat",
            method = "POST",
            path = %path,
            model = %model,
            is_stream = is_stream
        );
        let response = client
            .post(url)
            .headers(req_headers)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    event = "upstream_response",
                    trace_id = %ctx.trace_id,
                    provider = %PROVIDER_NAME,
                    op = "openai.chat",
                    status = "error",
                    elapsed_ms = started_at.elapsed().as_millis(),
                    error = %err
                );
                network_failure(err)
            })?;
        let status = response.status();
        if status.is_success() {
            info!(
                event = "upstream_response",
                trace_id = %ctx.trace_id,
                provider = %PROVIDER_NAME,
                op = "openai.chat",
                status = %status.as_u16(),
                elapsed_ms = started_at.elapsed().as_millis(),
                is_stream = is_stream
            );
        } else {
            warn!(
                event = "upstream_response",
                trace_id = %ctx.trace_id,
                provider = %PROVIDER_NAME,
                op = "openai.chat",
                status = %status.as_u16(),
                elapsed_ms = started_at.elapsed().as_millis(),
                is_stream = is_stream
            );
        }
        let response = handle_response(response, is_stream).await?;
        Ok(UpstreamOk {
            response,
            meta: UpstreamMeta {
                provider: PROVIDER_NAME,
                operation: "openai.chat",
                model,
            },
        })
    }
}

fn prepare_chat_body(
    mut body: openai::create_chat_completions::request::CreateChatCompletionRequestBody,
    is_stream: bool,
) -> openai::create_chat_completions::request::CreateChatCompletionRequestBody {
    if is_stream {
        body.stream = Some(true);
        match &mut body.stream_options {
            Some(options) => {
                if options.include_usage.is_none() {
                    options.include_usage = Some(true);
                }
            }
            None => {
                body.stream_options =
                    Some(openai::create_chat_completions::types::ChatCompletionStreamOptions {
                        include_usage: Some(true),
                    });
            }
        }
    } else {
        body.stream = None;
        body.stream_options = None;
    }
    body
}

fn build_copilot_headers(
    config: &CopilotConfig,
    is_stream: bool,
) -> Result<HeaderMap, UpstreamPassthroughError> {
    let mut headers = HeaderMap::new();
    let mut bearer = String::with_capacity(config.token.len() + 7);
    bearer.push_str("Bearer ");
    bearer.push_str(&config.token);
    headers.insert(AUTHORIZATION, header_value(&bearer)?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(COPILOT_INTEGRATION_ID, header_value(&config.integration_id)?);
    headers.insert(EDITOR_VERSION, header_value(&config.editor_version)?);
    if is_stream {
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, UpstreamPassthroughError> {
    HeaderValue::from_str(value)
        .map_err(|err| UpstreamPassthroughError::service_unavailable(err.to_string()))
}

fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
