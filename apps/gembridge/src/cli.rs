use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "gembridge", version, about = "Gemini API front for GitHub Copilot chat completions")]
pub struct Cli {
    #[arg(long, env = "GEMBRIDGE_HOST")]
    pub host: Option<String>,
    #[arg(long, env = "GEMBRIDGE_PORT")]
    pub port: Option<u16>,
    /// TOML file; CLI flags and environment variables take precedence.
    #[arg(long, short = 'c', env = "GEMBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, env = "COPILOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    #[arg(long, env = "COPILOT_BASE_URL")]
    pub base_url: Option<String>,
    /// Outbound proxy, e.g. `socks5://127.0.0.1:1080`.
    #[arg(long, env = "GEMBRIDGE_PROXY")]
    pub proxy: Option<String>,
    /// Allowed model ids. Repeat or separate with commas.
    #[arg(long = "model", env = "GEMBRIDGE_MODELS", value_delimiter = ',')]
    pub models: Vec<String>,
    #[arg(long, env = "GEMBRIDGE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
    #[arg(long)]
    pub log_json: bool,
}
