use gembridge_protocol::gemini::generate_content::types::FinishReason as GeminiFinishReason;
use gembridge_protocol::openai::create_chat_completions::types::ChatFinishReason as OpenAIFinishReason;

/// Map an OpenAI finish reason onto Gemini's. A missing reason stays missing.
pub fn map_finish_reason(reason: Option<OpenAIFinishReason>) -> Option<GeminiFinishReason> {
    let mapped = match reason? {
        OpenAIFinishReason::Stop => GeminiFinishReason::Stop,
        OpenAIFinishReason::Length => GeminiFinishReason::MaxTokens,
        OpenAIFinishReason::ContentFilter => GeminiFinishReason::Safety,
        // Gemini ends a function-calling turn with STOP.
        OpenAIFinishReason::ToolCalls | OpenAIFinishReason::FunctionCall => GeminiFinishReason::Stop,
        OpenAIFinishReason::Unknown => GeminiFinishReason::Other,
    };
    Some(mapped)
}
