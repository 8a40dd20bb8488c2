pub mod copilot;

pub use copilot::{CopilotConfig, CopilotProvider};
