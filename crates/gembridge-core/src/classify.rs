use bytes::Bytes;
use http::Method;

use gembridge_protocol::gemini::generate_content::request::{
    GenerateContentPath, GenerateContentRequest, GenerateContentRequestBody,
};
use gembridge_protocol::gemini::get_model::request::{GetModelPath, GetModelRequest};
use gembridge_provider_core::{GeminiApiVersion, ProxyRequest};

use crate::error::ProxyError;
use crate::models::ModelCatalog;

const GENERATE_CONTENT: &str = "generateContent";
const STREAM_GENERATE_CONTENT: &str = "streamGenerateContent";

#[derive(Debug)]
pub enum ClassifiedRequest {
    /// Forwarded to the provider.
    Provider(ProxyRequest),
    ModelsList {
        version: GeminiApiVersion,
    },
    ModelsGet {
        version: GeminiApiVersion,
        request: GetModelRequest,
    },
}

/// Resolves `/{version}/{path}` into a request. `path` is everything after
/// the version segment, e.g. `models/gpt-4o:streamGenerateContent`.
pub fn classify_request(
    method: &Method,
    version: &str,
    path: &str,
    body: Bytes,
    models: &ModelCatalog,
) -> Result<ClassifiedRequest, ProxyError> {
    let version = version
        .parse::<GeminiApiVersion>()
        .map_err(|_| ProxyError::not_found(format!("unsupported API version `{version}`")))?;
    let path = path.trim_matches('/');

    if path == "models" {
        return match *method {
            Method::GET => Ok(ClassifiedRequest::ModelsList { version }),
            _ => Err(ProxyError::method_not_allowed("models only supports GET")),
        };
    }
    let Some(target) = path.strip_prefix("models/") else {
        return Err(ProxyError::not_found(format!("unknown route `/{version}/{path}`")));
    };

    match *method {
        Method::GET => {
            if !models.contains(target) {
                return Err(ProxyError::not_found(format!("model `{target}` is not available")));
            }
            Ok(ClassifiedRequest::ModelsGet {
                version,
                request: GetModelRequest {
                    path: GetModelPath {
                        name: target.to_string(),
                    },
                },
            })
        }
        Method::POST => classify_generate(version, target, body, models),
        _ => Err(ProxyError::method_not_allowed(format!("{method} is not supported"))),
    }
}

fn classify_generate(
    version: GeminiApiVersion,
    target: &str,
    body: Bytes,
    models: &ModelCatalog,
) -> Result<ClassifiedRequest, ProxyError> {
    let (model, action) = extract_model(target)?;
    if !models.contains(model) {
        return Err(ProxyError::bad_request(format!("model `{model}` is not supported")));
    }
    let is_stream = match action {
        GENERATE_CONTENT => false,
        STREAM_GENERATE_CONTENT => true,
        other => return Err(ProxyError::not_found(format!("unsupported method `{other}`"))),
    };

    let body = serde_json::from_slice::<GenerateContentRequestBody>(&body)
        .map_err(|err| ProxyError::bad_request(format!("invalid request body: {err}")))?;
    let request = GenerateContentRequest {
        path: GenerateContentPath {
            model: model.to_string(),
        },
        body,
    };
    Ok(ClassifiedRequest::Provider(if is_stream {
        ProxyRequest::GeminiGenerateStream { version, request }
    } else {
        ProxyRequest::GeminiGenerate { version, request }
    }))
}

/// Splits `gpt-4o:generateContent` at the last `:`.
pub fn extract_model(target: &str) -> Result<(&str, &str), ProxyError> {
    match target.rsplit_once(':') {
        Some((model, action)) if !model.is_empty() && !action.is_empty() => Ok((model, action)),
        _ => Err(ProxyError::bad_request(format!(
            "could not find a model name in `models/{target}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    fn catalog() -> ModelCatalog {
        ModelCatalog::new(["gpt-4o", "claude-sonnet-4"])
    }

    fn hi() -> Bytes {
        Bytes::from_static(br#"{"contents":[{"role":"user","parts":[{"text":"Hi"}]}]}"#)
    }

    #[test]
    fn generate_and_stream_routes() {
        let classified = classify_request(
            &Method::POST,
            "v1beta",
            "models/gpt-4o:generateContent",
            hi(),
            &catalog(),
        )
        .unwrap();
        let ClassifiedRequest::Provider(ProxyRequest::GeminiGenerate { version, request }) =
            classified
        else {
            panic!("expected generate request");
        };
        assert_eq!(version, GeminiApiVersion::V1Beta);
        assert_eq!(request.path.model, "gpt-4o");
        assert_eq!(request.body.contents.len(), 1);

        let classified = classify_request(
            &Method::POST,
            "v1",
            "models/claude-sonnet-4:streamGenerateContent",
            hi(),
            &catalog(),
        )
        .unwrap();
        assert!(matches!(
            classified,
            ClassifiedRequest::Provider(ProxyRequest::GeminiGenerateStream {
                version: GeminiApiVersion::V1,
                ..
            })
        ));
    }

    #[test]
    fn model_outside_allow_list_is_rejected() {
        let err = classify_request(
            &Method::POST,
            "v1beta",
            "models/gemini-2.5-pro:generateContent",
            hi(),
            &catalog(),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn path_without_model_separator_is_rejected() {
        let err = classify_request(&Method::POST, "v1beta", "models/gpt-4o", hi(), &catalog())
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        assert!(extract_model(":generateContent").is_err());
        assert_eq!(
            extract_model("gpt-4o:generateContent").unwrap(),
            ("gpt-4o", "generateContent")
        );
    }

    #[test]
    fn malformed_body_and_unknown_part_are_client_errors() {
        let err = classify_request(
            &Method::POST,
            "v1beta",
            "models/gpt-4o:generateContent",
            Bytes::from_static(b"{not json"),
            &catalog(),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = classify_request(
            &Method::POST,
            "v1beta",
            "models/gpt-4o:generateContent",
            Bytes::from_static(br#"{"contents":[{"role":"user","parts":[{"videoMetadata":{}}]}]}"#),
            &catalog(),
        )
        .unwrap_err();
        let body: serde_json::Value = serde_json::from_slice(&err.body).unwrap();
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("part must carry one of")
        );
    }

    #[test]
    fn model_listing_routes() {
        assert!(matches!(
            classify_request(&Method::GET, "v1beta", "models", Bytes::new(), &catalog()).unwrap(),
            ClassifiedRequest::ModelsList { .. }
        ));
        let ClassifiedRequest::ModelsGet { request, .. } =
            classify_request(&Method::GET, "v1", "models/gpt-4o", Bytes::new(), &catalog())
                .unwrap()
        else {
            panic!("expected model lookup");
        };
        assert_eq!(request.path.name, "gpt-4o");
        let err = classify_request(&Method::GET, "v1", "models/o3", Bytes::new(), &catalog())
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn unknown_version_and_route_are_not_found() {
        let err = classify_request(&Method::GET, "v2", "models", Bytes::new(), &catalog())
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let err = classify_request(&Method::GET, "v1", "files", Bytes::new(), &catalog())
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
