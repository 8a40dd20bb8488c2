use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use gembridge_provider_impl::CopilotConfig;
use gembridge_provider_impl::provider::copilot::{
    DEFAULT_BASE_URL, DEFAULT_EDITOR_VERSION, DEFAULT_INTEGRATION_ID,
};

use crate::cli::Cli;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MODELS: &[&str] = &["gpt-4o", "gpt-4.1", "o3-mini", "claude-sonnet-4"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing Copilot token: pass --token, set COPILOT_TOKEN or `token` in the config file")]
    MissingToken,
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Shape of the optional TOML config file. Every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub proxy: Option<String>,
    pub models: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub integration_id: Option<String>,
    pub editor_version: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub token: String,
    pub proxy: Option<String>,
    pub models: Vec<String>,
    pub timeout_secs: u64,
    pub integration_id: String,
    pub editor_version: String,
}

impl GlobalConfig {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    /// CLI and environment win over the file, the file wins over defaults.
    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let token = non_blank(cli.token.clone())
            .or(non_blank(file.token))
            .ok_or(ConfigError::MissingToken)?;
        let timeout_secs = cli
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let models = if !cli.models.is_empty() {
            cli.models.clone()
        } else {
            file.models
                .filter(|models| !models.is_empty())
                .unwrap_or_else(|| DEFAULT_MODELS.iter().map(|model| model.to_string()).collect())
        };

        Ok(Self {
            host: non_blank(cli.host.clone())
                .or(non_blank(file.host))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            base_url: non_blank(cli.base_url.clone())
                .or(non_blank(file.base_url))
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token,
            proxy: non_blank(cli.proxy.clone()).or(non_blank(file.proxy)),
            models,
            timeout_secs,
            integration_id: non_blank(file.integration_id)
                .unwrap_or_else(|| DEFAULT_INTEGRATION_ID.to_string()),
            editor_version: non_blank(file.editor_version)
                .unwrap_or_else(|| DEFAULT_EDITOR_VERSION.to_string()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn copilot(&self) -> CopilotConfig {
        CopilotConfig {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            integration_id: self.integration_id.clone(),
            editor_version: self.editor_version.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
