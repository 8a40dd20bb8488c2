use serde::{Deserialize, Serialize};

use super::types::{Content, GenerationConfig, JsonValue, Tool, ToolConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentPath {
    /// Model id without the `models/` prefix.
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequestBody {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<JsonValue>,
}

#[derive(Debug, Clone)]
pub struct GenerateContentRequest {
    pub path: GenerateContentPath,
    pub body: GenerateContentRequestBody,
}
