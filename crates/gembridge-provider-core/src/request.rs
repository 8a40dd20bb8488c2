use std::fmt;
use std::str::FromStr;

use gembridge_protocol::gemini;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeminiApiVersion {
    V1,
    V1Beta,
}

impl GeminiApiVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            GeminiApiVersion::V1 => "v1",
            GeminiApiVersion::V1Beta => "v1beta",
        }
    }
}

impl FromStr for GeminiApiVersion {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "v1" => Ok(GeminiApiVersion::V1),
            "v1beta" => Ok(GeminiApiVersion::V1Beta),
            _ => Err(()),
        }
    }
}

impl fmt::Display for GeminiApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A downstream request the gateway accepted.
#[derive(Debug, Clone)]
pub enum ProxyRequest {
    GeminiGenerate {
        version: GeminiApiVersion,
        request: gemini::generate_content::request::GenerateContentRequest,
    },
    GeminiGenerateStream {
        version: GeminiApiVersion,
        request: gemini::generate_content::request::GenerateContentRequest,
    },
}

impl ProxyRequest {
    pub fn model(&self) -> &str {
        match self {
            ProxyRequest::GeminiGenerate { request, .. }
            | ProxyRequest::GeminiGenerateStream { request, .. } => &request.path.model,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, ProxyRequest::GeminiGenerateStream { .. })
    }
}
