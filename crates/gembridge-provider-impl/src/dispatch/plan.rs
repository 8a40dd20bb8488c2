use gembridge_provider_core::{GeminiApiVersion, ProxyRequest};
use gembridge_protocol::{gemini, openai};

pub enum TransformPlan {
    /// Gemini generateContent -> OpenAI chat completions
    GenerateContent {
        version: GeminiApiVersion,
        request: gemini::generate_content::request::GenerateContentRequest,
    },
    /// Gemini streamGenerateContent -> OpenAI chat completions stream
    StreamContent {
        version: GeminiApiVersion,
        request: gemini::generate_content::request::GenerateContentRequest,
    },
}

impl TransformPlan {
    pub fn operation(&self) -> &'static str {
        match self {
            TransformPlan::GenerateContent { .. } => "gemini.generate",
            TransformPlan::StreamContent { .. } => "gemini.stream_generate",
        }
    }
}

impl From<ProxyRequest> for TransformPlan {
    fn from(req: ProxyRequest) -> Self {
        match req {
            ProxyRequest::GeminiGenerate { version, request } => {
                TransformPlan::GenerateContent { version, request }
            }
            ProxyRequest::GeminiGenerateStream { version, request } => {
                TransformPlan::StreamContent { version, request }
            }
        }
    }
}

/// What actually goes over the wire once a Gemini request is translated.
#[derive(Debug, Clone)]
pub enum UpstreamRequest {
    OpenAIChat(openai::create_chat_completions::request::CreateChatCompletionRequest),
    OpenAIChatStream(openai::create_chat_completions::request::CreateChatCompletionRequest),
}

impl UpstreamRequest {
    pub fn model(&self) -> &str {
        match self {
            UpstreamRequest::OpenAIChat(request) | UpstreamRequest::OpenAIChatStream(request) => {
                &request.body.model
            }
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, UpstreamRequest::OpenAIChatStream(_))
    }
}
