use gembridge_protocol::gemini::generate_content::request::GenerateContentRequest as GeminiGenerateContentRequest;
use gembridge_protocol::gemini::generate_content::types::{
    Content, ContentRole, FunctionCallingMode, FunctionDeclaration, GenerationConfig, JsonValue,
    Part, Tool, ToolConfig,
};
use gembridge_protocol::openai::create_chat_completions::request::{
    CreateChatCompletionRequest as OpenAIChatCompletionRequest, CreateChatCompletionRequestBody,
};
use gembridge_protocol::openai::create_chat_completions::types::{
    ChatMessage, ChatTool, ContentPart, FunctionObject, ImageUrl, JsonSchemaFormat,
    MessageContent, ResponseFormat, ToolChoice,
};

use super::correlate::correlate;
use crate::error::TransformError;
use crate::schema::{
    SchemaValidation, format_errors, lowercase_types, parameters_or_default, rewrite, validate_at,
    validate_tools,
};

pub const CONTINUE_PROMPT: &str = "Please continue based on the tool results above.";
pub const RESPONSE_SCHEMA_NAME: &str = "response_schema";

const JSON_MIME_TYPE: &str = "application/json";

/// Convert a Gemini generate-content request into an OpenAI chat-completions
/// request. `stream` is left unset for the caller to decide.
pub fn transform_request(
    request: GeminiGenerateContentRequest,
) -> Result<OpenAIChatCompletionRequest, TransformError> {
    let body = request.body;
    let mut messages = Vec::with_capacity(body.contents.len() + 2);

    if let Some(system) = body.system_instruction.as_ref().and_then(system_message) {
        messages.push(system);
    }
    messages.extend(correlate(&body.contents, plain_message).messages);

    let tools = body.tools.as_deref().map(map_tools).unwrap_or_default();
    let generation_config = body.generation_config.unwrap_or_default();
    let response_format = map_response_format(&generation_config);

    let mut checks = Vec::new();
    if !tools.is_empty() {
        checks.push(validate_tools(&tools));
    }
    if let Some(ResponseFormat::JsonSchema { json_schema }) = &response_format {
        checks.push(validate_at(&json_schema.schema, "response_format.json_schema.schema"));
    }
    let validation = SchemaValidation::merge(checks);
    if !validation.is_valid() {
        return Err(TransformError::SchemaValidation(format_errors(&validation.errors)));
    }

    if matches!(messages.last(), Some(ChatMessage::Tool { .. })) {
        messages.push(ChatMessage::User {
            content: MessageContent::Text(CONTINUE_PROMPT.to_string()),
        });
    }

    Ok(OpenAIChatCompletionRequest {
        body: CreateChatCompletionRequestBody {
            model: request.path.model,
            messages,
            temperature: generation_config.temperature,
            top_p: generation_config.top_p,
            max_tokens: generation_config.max_output_tokens,
            stop: generation_config.stop_sequences,
            n: generation_config.candidate_count,
            tools: (!tools.is_empty()).then_some(tools),
            tool_choice: body.tool_config.as_ref().and_then(map_tool_choice),
            response_format,
            stream: None,
            stream_options: None,
        },
    })
}

fn system_message(instruction: &Content) -> Option<ChatMessage> {
    let text = joined_text(instruction, "\n\n");
    (!text.is_empty()).then_some(ChatMessage::System { content: text })
}

fn joined_text(content: &Content, separator: &str) -> String {
    content
        .parts
        .iter()
        .filter_map(Part::as_text)
        .collect::<Vec<_>>()
        .join(separator)
}

/// A turn with neither calls nor results. Turns with nothing to say are
/// skipped.
fn plain_message(turn: &Content) -> Option<ChatMessage> {
    if turn.role == Some(ContentRole::System) {
        return system_message(turn);
    }

    let content = if turn.parts.iter().any(Part::is_media) {
        let parts: Vec<ContentPart> = turn.parts.iter().filter_map(content_part).collect();
        if parts.is_empty() {
            return None;
        }
        MessageContent::Parts(parts)
    } else if turn.parts.is_empty() {
        return None;
    } else {
        MessageContent::Text(joined_text(turn, "\n"))
    };

    Some(match turn.role {
        Some(ContentRole::Model) => ChatMessage::Assistant {
            content: Some(content),
            tool_calls: None,
        },
        _ => ChatMessage::User { content },
    })
}

fn content_part(part: &Part) -> Option<ContentPart> {
    match part {
        Part::Text(text) => Some(ContentPart::Text { text: text.clone() }),
        Part::InlineData(blob) => Some(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{};base64,{}", blob.mime_type, blob.data),
            },
        }),
        Part::FileData(file) => Some(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: file.file_uri.clone(),
            },
        }),
        Part::FunctionCall(_) | Part::FunctionResponse(_) => None,
    }
}

fn map_tools(tools: &[Tool]) -> Vec<ChatTool> {
    tools
        .iter()
        .filter_map(|tool| tool.function_declarations.as_deref())
        .flatten()
        .map(map_function_declaration)
        .collect()
}

fn map_function_declaration(declaration: &FunctionDeclaration) -> ChatTool {
    // `response` / `responseJsonSchema` have no chat-completions counterpart.
    let parameters = match declaration
        .parameters_json_schema
        .as_ref()
        .filter(|schema| is_populated(schema))
    {
        Some(schema) => parameters_or_default(Some(schema)),
        // OpenAPI subset: type names may be uppercase.
        None => parameters_or_default(declaration.parameters.as_ref().map(lowercase_types).as_ref()),
    };

    ChatTool::function(FunctionObject {
        name: declaration.name.clone(),
        description: declaration.description.clone(),
        parameters,
        strict: Some(true),
    })
}

fn map_tool_choice(config: &ToolConfig) -> Option<ToolChoice> {
    match config.function_calling_config.as_ref()?.mode? {
        FunctionCallingMode::Auto => Some(ToolChoice::Auto),
        FunctionCallingMode::Any => Some(ToolChoice::Required),
        FunctionCallingMode::None => Some(ToolChoice::None),
        FunctionCallingMode::ModeUnspecified
        | FunctionCallingMode::Validated
        | FunctionCallingMode::Unknown => None,
    }
}

fn map_response_format(config: &GenerationConfig) -> Option<ResponseFormat> {
    let schema = match config
        .response_json_schema
        .as_ref()
        .filter(|schema| is_populated(schema))
    {
        Some(schema) => Some(rewrite(schema)),
        None => config
            .response_schema
            .as_ref()
            .filter(|schema| is_populated(schema))
            .map(|schema| rewrite(&lowercase_types(schema))),
    };

    if let Some(schema) = schema {
        return Some(ResponseFormat::JsonSchema {
            json_schema: JsonSchemaFormat {
                name: RESPONSE_SCHEMA_NAME.to_string(),
                schema,
                strict: Some(true),
            },
        });
    }

    (config.response_mime_type.as_deref() == Some(JSON_MIME_TYPE))
        .then_some(ResponseFormat::JsonObject)
}

fn is_populated(schema: &JsonValue) -> bool {
    match schema {
        JsonValue::Null => false,
        JsonValue::Object(node) => !node.is_empty(),
        _ => true,
    }
}
