mod plan;
mod stream;
mod transform;

pub use plan::{TransformPlan, UpstreamRequest};
pub use stream::gemini_stream_from_openai_chat;

use async_trait::async_trait;

use gembridge_provider_core::{CallContext, ProxyRequest, ProxyResponse, UpstreamPassthroughError};

/// What the upstream call was, for logs emitted after the response is
/// already flowing.
#[derive(Debug, Clone)]
pub struct UpstreamMeta {
    pub provider: &'static str,
    pub operation: &'static str,
    pub model: String,
}

pub struct UpstreamOk {
    pub response: ProxyResponse,
    pub meta: UpstreamMeta,
}

/// A backend that speaks OpenAI chat completions. Gemini requests reach it
/// only after translation.
#[async_trait]
pub trait DispatchProvider: Send + Sync {
    async fn call_upstream(
        &self,
        req: UpstreamRequest,
        ctx: CallContext,
    ) -> Result<UpstreamOk, UpstreamPassthroughError>;
}

pub async fn dispatch_request<P: DispatchProvider>(
    provider: &P,
    req: ProxyRequest,
    ctx: CallContext,
) -> Result<ProxyResponse, UpstreamPassthroughError> {
    transform::dispatch_transform(provider, TransformPlan::from(req), ctx).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use futures_util::StreamExt;
    use futures_util::stream;
    use http::{HeaderMap, StatusCode};
    use serde_json::json;

    use gembridge_protocol::gemini::generate_content::request::{
        GenerateContentPath, GenerateContentRequest, GenerateContentRequestBody,
    };
    use gembridge_provider_core::{GeminiApiVersion, StreamBody};

    use super::*;

    /// Answers every native chat call with a canned body and remembers what
    /// it was sent.
    struct CannedProvider {
        reply: &'static str,
        seen: Mutex<Vec<UpstreamRequest>>,
    }

    impl CannedProvider {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DispatchProvider for CannedProvider {
        async fn call_upstream(
            &self,
            req: UpstreamRequest,
            _ctx: CallContext,
        ) -> Result<UpstreamOk, UpstreamPassthroughError> {
            let is_stream = req.is_stream();
            let model = req.model().to_string();
            self.seen.lock().unwrap().push(req);
            let body = Bytes::from_static(self.reply.as_bytes());
            let response = if is_stream {
                ProxyResponse::Stream {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body: StreamBody::new("text/event-stream", stream::iter(vec![Ok::<_, std::io::Error>(body)])),
                }
            } else {
                ProxyResponse::Json {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body,
                }
            };
            Ok(UpstreamOk {
                response,
                meta: UpstreamMeta {
                    provider: "canned",
                    operation: "openai.chat",
                    model,
                },
            })
        }
    }

    fn gemini(body: serde_json::Value) -> GenerateContentRequest {
        GenerateContentRequest {
            path: GenerateContentPath {
                model: "gpt-4o".to_string(),
            },
            body: serde_json::from_value::<GenerateContentRequestBody>(body).unwrap(),
        }
    }

    #[tokio::test]
    async fn generate_is_translated_both_ways() {
        let provider = CannedProvider::new(
            r#"{"id":"x","model":"gpt-4o","choices":[{"index":0,"message":{"content":"Hello"},"finish_reason":"stop"}]}"#,
        );
        let req = ProxyRequest::GeminiGenerate {
            version: GeminiApiVersion::V1Beta,
            request: gemini(json!({"contents": [{"role": "user", "parts": [{"text": "Hi"}]}]})),
        };

        let response = dispatch_request(&provider, req, CallContext::new("t")).await.unwrap();

        let ProxyResponse::Json { body, .. } = response else {
            panic!("expected json");
        };
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["candidates"][0]["content"]["parts"][0]["text"], "Hello");
        let seen = provider.seen.lock().unwrap();
        let UpstreamRequest::OpenAIChat(upstream) = &seen[0] else {
            panic!("expected chat request upstream");
        };
        assert_eq!(upstream.body.messages.len(), 1);
        assert_eq!(upstream.body.model, "gpt-4o");
    }

    #[tokio::test]
    async fn stream_is_reframed() {
        let provider = CannedProvider::new(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n",
        );
        let req = ProxyRequest::GeminiGenerateStream {
            version: GeminiApiVersion::V1,
            request: gemini(json!({"contents": [{"role": "user", "parts": [{"text": "Hi"}]}]})),
        };

        let response = dispatch_request(&provider, req, CallContext::new("t")).await.unwrap();

        let ProxyResponse::Stream { mut body, .. } = response else {
            panic!("expected stream");
        };
        let mut frames = Vec::new();
        while let Some(frame) = body.stream.next().await {
            frames.push(frame.unwrap());
        }
        assert_eq!(frames.len(), 1);
        assert!(frames[0].starts_with(b"data: {\"candidates\""));
        assert!(frames[0].ends_with(b"\r\n\r\n"));
        assert!(matches!(
            &provider.seen.lock().unwrap()[0],
            UpstreamRequest::OpenAIChatStream(_)
        ));
    }

    #[tokio::test]
    async fn schema_violation_never_reaches_the_backend() {
        let provider = CannedProvider::new("{}");
        let req = ProxyRequest::GeminiGenerate {
            version: GeminiApiVersion::V1Beta,
            request: gemini(json!({
                "contents": [{"role": "user", "parts": [{"text": "Hi"}]}],
                "tools": [{"functionDeclarations": [{
                    "name": "f",
                    "parameters": {"type": "object", "properties": {"xs": {"type": "array"}}}
                }]}]
            })),
        };

        let err = dispatch_request(&provider, req, CallContext::new("t")).await.unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(provider.seen.lock().unwrap().is_empty());
    }
}
