pub mod client;
pub mod dispatch;
pub mod provider;
pub mod upstream;

pub use provider::{CopilotConfig, CopilotProvider};
