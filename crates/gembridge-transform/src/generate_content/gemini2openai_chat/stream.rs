use gembridge_protocol::gemini::generate_content::response::GenerateContentResponse as GeminiGenerateContentResponse;
use gembridge_protocol::gemini::generate_content::types::{
    Candidate, Content, FunctionCall as GeminiFunctionCall, JsonValue, Part,
};
use gembridge_protocol::openai::create_chat_completions::stream::CreateChatCompletionStreamResponse as OpenAIChatCompletionChunk;

use super::finish_reason::map_finish_reason;
use super::response::{map_usage, non_empty};

/// Convert one OpenAI stream chunk into one Gemini stream event.
///
/// Tool-call fragments surface only when they carry a function name; their
/// arguments are parsed from whatever the fragment holds, falling back to
/// `{}`. Argument-only continuation fragments are dropped.
pub fn transform_chunk(chunk: OpenAIChatCompletionChunk) -> GeminiGenerateContentResponse {
    let candidates = chunk
        .choices
        .into_iter()
        .map(|choice| {
            let mut parts = Vec::new();
            if let Some(text) = choice.delta.content.filter(|text| !text.is_empty()) {
                parts.push(Part::Text(text));
            }
            for fragment in choice.delta.tool_calls.unwrap_or_default() {
                let Some(function) = fragment.function else {
                    continue;
                };
                let Some(name) = function.name.filter(|name| !name.is_empty()) else {
                    continue;
                };
                let args = function
                    .arguments
                    .as_deref()
                    .and_then(|raw| serde_json::from_str::<JsonValue>(raw).ok())
                    .unwrap_or_else(|| JsonValue::Object(Default::default()));
                parts.push(Part::FunctionCall(GeminiFunctionCall {
                    id: fragment.id,
                    name,
                    args: Some(args),
                }));
            }
            Candidate {
                content: Content::model(parts),
                finish_reason: map_finish_reason(choice.finish_reason),
                index: Some(choice.index),
            }
        })
        .collect();

    GeminiGenerateContentResponse {
        candidates,
        usage_metadata: chunk.usage.map(map_usage),
        model_version: non_empty(chunk.model),
        response_id: non_empty(chunk.id),
    }
}

/// True when the event has nothing worth forwarding: no candidate with parts
/// or a finish reason, and no usage.
pub fn is_empty_chunk(response: &GeminiGenerateContentResponse) -> bool {
    response.usage_metadata.is_none()
        && response
            .candidates
            .iter()
            .all(|candidate| candidate.content.parts.is_empty() && candidate.finish_reason.is_none())
}
