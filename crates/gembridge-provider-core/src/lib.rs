pub mod provider;
pub mod request;
pub mod response;

pub use provider::{CallContext, Provider};
pub use request::{GeminiApiVersion, ProxyRequest};
pub use response::{ByteStream, ProxyResponse, StreamBody, UpstreamPassthroughError, grpc_status};
