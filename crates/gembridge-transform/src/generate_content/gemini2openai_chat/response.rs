use gembridge_protocol::gemini::generate_content::response::GenerateContentResponse as GeminiGenerateContentResponse;
use gembridge_protocol::gemini::generate_content::types::{
    Candidate, Content, FunctionCall as GeminiFunctionCall, JsonValue, Part, UsageMetadata,
};
use gembridge_protocol::openai::create_chat_completions::response::CreateChatCompletionResponse as OpenAIChatCompletionResponse;
use gembridge_protocol::openai::create_chat_completions::types::{CompletionUsage, ToolCall};

use super::finish_reason::map_finish_reason;
use crate::error::TransformError;

/// Convert an OpenAI chat completion into a Gemini generate-content response.
///
/// Fails when a tool call carries arguments that are not valid JSON.
pub fn transform_response(
    response: OpenAIChatCompletionResponse,
) -> Result<GeminiGenerateContentResponse, TransformError> {
    let mut candidates = Vec::with_capacity(response.choices.len());
    for choice in response.choices {
        let mut parts = Vec::new();
        if let Some(text) = choice.message.content.filter(|text| !text.is_empty()) {
            parts.push(Part::Text(text));
        }
        for call in choice.message.tool_calls.unwrap_or_default() {
            parts.push(function_call_part(call)?);
        }
        candidates.push(Candidate {
            content: Content::model(parts),
            finish_reason: map_finish_reason(choice.finish_reason),
            index: Some(choice.index),
        });
    }

    Ok(GeminiGenerateContentResponse {
        candidates,
        usage_metadata: response.usage.map(map_usage),
        model_version: non_empty(response.model),
        response_id: non_empty(response.id),
    })
}

fn function_call_part(call: ToolCall) -> Result<Part, TransformError> {
    let args = if call.function.arguments.trim().is_empty() {
        JsonValue::Object(Default::default())
    } else {
        match serde_json::from_str(&call.function.arguments) {
            Ok(args) => args,
            Err(source) => {
                return Err(TransformError::InvalidToolArguments {
                    name: call.function.name,
                    source,
                });
            }
        }
    };
    Ok(Part::FunctionCall(GeminiFunctionCall {
        id: Some(call.id),
        name: call.function.name,
        args: Some(args),
    }))
}

pub(crate) fn map_usage(usage: CompletionUsage) -> UsageMetadata {
    UsageMetadata {
        prompt_token_count: Some(usage.prompt_tokens),
        candidates_token_count: Some(usage.completion_tokens),
        total_token_count: Some(usage.total_tokens),
        cached_content_token_count: usage
            .prompt_tokens_details
            .and_then(|details| details.cached_tokens),
    }
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use gembridge_protocol::gemini::generate_content::types::{ContentRole, FinishReason};

    fn completion(value: JsonValue) -> OpenAIChatCompletionResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn text_choice_becomes_model_candidate() {
        let out = transform_response(completion(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1,
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello"},
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 3,
                "completion_tokens": 1,
                "total_tokens": 4,
                "prompt_tokens_details": {"cached_tokens": 2}
            }
        })))
        .unwrap();

        let candidate = &out.candidates[0];
        assert_eq!(candidate.content.role, Some(ContentRole::Model));
        assert_eq!(candidate.content.parts, vec![Part::text("Hello")]);
        assert_eq!(candidate.finish_reason, Some(FinishReason::Stop));
        assert_eq!(candidate.index, Some(0));
        assert_eq!(out.model_version.as_deref(), Some("gpt-4o"));
        assert_eq!(out.response_id.as_deref(), Some("chatcmpl-1"));
        assert_eq!(
            out.usage_metadata,
            Some(UsageMetadata {
                prompt_token_count: Some(3),
                candidates_token_count: Some(1),
                total_token_count: Some(4),
                cached_content_token_count: Some(2),
            })
        );
    }

    #[test]
    fn tool_calls_become_function_call_parts() {
        let out = transform_response(completion(json!({
            "id": "chatcmpl-2",
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_1", "type": "function", "function": {"name": "weather", "arguments": "{\"city\":\"Paris\"}"}},
                        {"id": "call_2", "type": "function", "function": {"name": "now", "arguments": ""}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .unwrap();

        let candidate = &out.candidates[0];
        assert_eq!(candidate.finish_reason, Some(FinishReason::Stop));
        assert_eq!(
            candidate.content.parts,
            vec![
                Part::FunctionCall(GeminiFunctionCall {
                    id: Some("call_1".to_string()),
                    name: "weather".to_string(),
                    args: Some(json!({"city": "Paris"})),
                }),
                Part::FunctionCall(GeminiFunctionCall {
                    id: Some("call_2".to_string()),
                    name: "now".to_string(),
                    args: Some(json!({})),
                }),
            ]
        );
    }

    #[test]
    fn malformed_arguments_fail_the_response() {
        let err = transform_response(completion(json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "tool_calls": [{"id": "c", "type": "function", "function": {"name": "f", "arguments": "{oops"}}]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .unwrap_err();

        assert!(matches!(err, TransformError::InvalidToolArguments { ref name, .. } if name == "f"));
    }

    #[test]
    fn missing_finish_reason_and_usage_are_omitted() {
        let out = transform_response(completion(json!({
            "choices": [{"index": 1, "message": {"content": "partial"}, "finish_reason": null}]
        })))
        .unwrap();

        assert_eq!(out.candidates[0].finish_reason, None);
        assert_eq!(out.candidates[0].index, Some(1));
        assert!(out.usage_metadata.is_none());
        assert!(out.model_version.is_none());
    }
}
