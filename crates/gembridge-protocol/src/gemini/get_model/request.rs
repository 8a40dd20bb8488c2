use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetModelPath {
    /// Model id, with or without the `models/` prefix.
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct GetModelRequest {
    pub path: GetModelPath,
}
