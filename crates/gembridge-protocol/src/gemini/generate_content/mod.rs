pub mod types;
pub mod request;
pub mod response;

pub use request::{GenerateContentPath, GenerateContentRequest, GenerateContentRequestBody};
pub use response::GenerateContentResponse;
pub use types::*;
