use std::fmt;

use serde::{Deserialize, Serialize};

pub type JsonValue = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
    User,
    Model,
    /// Some clients tag function results with this role instead of `user`.
    Function,
    System,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ContentRole>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Some(ContentRole::Model),
            parts,
        }
    }

    pub fn has_function_call(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, Part::FunctionCall(_)))
    }

    pub fn has_function_response(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, Part::FunctionResponse(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64 encoded bytes.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub file_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub response: JsonValue,
}

/// One unit of a turn. The wire format distinguishes kinds by which key is
/// present; the variant is resolved once when the part is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PartRepr", into = "PartRepr")]
pub enum Part {
    Text(String),
    InlineData(Blob),
    FileData(FileData),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, Part::InlineData(_) | Part::FileData(_))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<Blob>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedPart;

impl fmt::Display for UnrecognizedPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(
            "part must carry one of text, inlineData, fileData, functionCall, functionResponse",
        )
    }
}

impl TryFrom<PartRepr> for Part {
    type Error = UnrecognizedPart;

    fn try_from(repr: PartRepr) -> Result<Self, Self::Error> {
        if let Some(call) = repr.function_call {
            return Ok(Part::FunctionCall(call));
        }
        if let Some(response) = repr.function_response {
            return Ok(Part::FunctionResponse(response));
        }
        if let Some(blob) = repr.inline_data {
            return Ok(Part::InlineData(blob));
        }
        if let Some(file) = repr.file_data {
            return Ok(Part::FileData(file));
        }
        repr.text.map(Part::Text).ok_or(UnrecognizedPart)
    }
}

impl From<Part> for PartRepr {
    fn from(part: Part) -> Self {
        let mut repr = PartRepr::default();
        match part {
            Part::Text(text) => repr.text = Some(text),
            Part::InlineData(blob) => repr.inline_data = Some(blob),
            Part::FileData(file) => repr.file_data = Some(file),
            Part::FunctionCall(call) => repr.function_call = Some(call),
            Part::FunctionResponse(response) => repr.function_response = Some(response),
        }
        repr
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// No chat-completions counterpart; accepted and ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_json_schema: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters_json_schema: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_json_schema: Option<JsonValue>,
}

/// Only function declarations are forwarded; built-in tools such as
/// `googleSearch` are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_declarations: Option<Vec<FunctionDeclaration>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionCallingMode {
    ModeUnspecified,
    Auto,
    Any,
    None,
    Validated,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<FunctionCallingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_function_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_calling_config: Option<FunctionCallingConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_content_token_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Content,
    /// Absent while a stream is still running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parts_resolve_to_their_variant() {
        let content: Content = serde_json::from_value(json!({
            "role": "user",
            "parts": [
                {"text": "look"},
                {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                {"functionCall": {"name": "f", "args": {"x": 1}}},
                {"functionResponse": {"id": "c1", "name": "f", "response": {"ok": true}}}
            ]
        }))
        .unwrap();

        assert_eq!(content.role, Some(ContentRole::User));
        assert_eq!(content.parts[0], Part::text("look"));
        assert!(content.parts[1].is_media());
        assert!(matches!(&content.parts[2], Part::FunctionCall(call) if call.name == "f"));
        assert!(
            matches!(&content.parts[3], Part::FunctionResponse(resp) if resp.id.as_deref() == Some("c1"))
        );
        assert!(content.has_function_call());
        assert!(content.has_function_response());
    }

    #[test]
    fn thought_text_parts_are_text() {
        let part: Part =
            serde_json::from_value(json!({"text": "hmm", "thought": true})).unwrap();
        assert_eq!(part.as_text(), Some("hmm"));
    }

    #[test]
    fn part_without_known_key_is_rejected() {
        let err = serde_json::from_value::<Part>(json!({"executableCode": {}})).unwrap_err();
        assert!(err.to_string().contains("part must carry one of"));
    }

    #[test]
    fn part_serializes_back_to_keyed_object() {
        let value = serde_json::to_value(Part::FunctionCall(FunctionCall {
            id: None,
            name: "f".to_string(),
            args: Some(json!({})),
        }))
        .unwrap();
        assert_eq!(value, json!({"functionCall": {"name": "f", "args": {}}}));
    }

    #[test]
    fn unknown_calling_mode_is_tolerated() {
        let config: FunctionCallingConfig =
            serde_json::from_value(json!({"mode": "SOMETHING_NEW"})).unwrap();
        assert_eq!(config.mode, Some(FunctionCallingMode::Unknown));
    }

    #[test]
    fn missing_finish_reason_is_not_serialized() {
        let candidate = Candidate {
            content: Content::model(vec![Part::text("Hi")]),
            finish_reason: None,
            index: Some(0),
        };
        let value = serde_json::to_value(candidate).unwrap();
        assert!(value.get("finishReason").is_none());
    }
}
