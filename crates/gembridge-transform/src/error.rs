use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// Outbound tool or response schemas are not strict-mode compliant. The
    /// message is the full formatted violation report.
    #[error("{0}")]
    SchemaValidation(String),
    #[error("tool call `{name}` has invalid JSON arguments: {source}")]
    InvalidToolArguments {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
