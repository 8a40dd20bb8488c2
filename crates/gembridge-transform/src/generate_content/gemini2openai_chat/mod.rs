//! Gemini `generateContent` clients served by an OpenAI chat-completions
//! upstream. `request` maps the inbound request; `response` and `stream`
//! map upstream results back.

pub mod correlate;
pub mod finish_reason;
pub mod request;
pub mod response;
pub mod stream;

pub use correlate::{CorrelationStats, correlate};
pub use finish_reason::map_finish_reason;
pub use request::transform_request;
pub use response::transform_response;
pub use stream::{is_empty_chunk, transform_chunk};
