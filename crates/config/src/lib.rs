//! Configuration management for toolchat
//!
//! Loads the reasoning engine, agent loop and gateway parameters from a JSON
//! file and overlays them with environment variables. The resulting
//! [`Config`] is passed explicitly to every component at construction time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub mod paths;

pub use paths::{config_path, data_dir};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("invalid value {value:?} for environment variable {key}")]
    InvalidEnv { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Reasoning engine connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.2
}

/// Agent loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Upper bound on tool-dispatch rounds within one turn
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            tool_timeout_secs: default_tool_timeout_secs(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_max_rounds() -> u32 {
    10
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_system_prompt() -> String {
    "You are a helpful assistant. Use the available tools when they help you \
     answer accurately, and reply with a concise final answer."
        .to_string()
}

/// HTTP gateway parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:4200".to_string()]
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load from the default location, then apply the process environment
    pub async fn load() -> Result<Self> {
        let path = config_path();
        let mut config = Self::load_from(&path).await?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a specific file; a missing file yields defaults
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("Reading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a specific file, creating parent directories
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("TOOLCHAT_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.engine.api_key = key;
        }
        if let Some(base) = get("TOOLCHAT_API_BASE") {
            self.engine.api_base = Some(base);
        }
        if let Some(model) = get("TOOLCHAT_MODEL") {
            self.engine.model = model;
        }
        if let Some(value) = get("TOOLCHAT_MAX_ROUNDS") {
            self.agent.max_rounds = parse_env("TOOLCHAT_MAX_ROUNDS", &value)?;
        }
        if let Some(value) = get("TOOLCHAT_TOOL_TIMEOUT_SECS") {
            let secs: u64 = parse_env("TOOLCHAT_TOOL_TIMEOUT_SECS", &value)?;
            if secs == 0 {
                return Err(ConfigError::InvalidEnv {
                    key: "TOOLCHAT_TOOL_TIMEOUT_SECS".to_string(),
                    value,
                });
            }
            self.agent.tool_timeout_secs = secs;
        }
        if let Some(host) = get("TOOLCHAT_HOST") {
            self.gateway.host = host;
        }
        if let Some(value) = get("TOOLCHAT_PORT") {
            self.gateway.port = parse_env("TOOLCHAT_PORT", &value)?;
        }
        if let Some(origins) = get("TOOLCHAT_ALLOWED_ORIGINS") {
            self.gateway.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(())
    }

    /// Reject values no component can run with
    pub fn validate(&self) -> Result<()> {
        if self.agent.tool_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "agent.tool_timeout_secs".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    /// Reasoning engine API key, if one is configured
    pub fn api_key(&self) -> Option<String> {
        if self.engine.api_key.is_empty() {
            None
        } else {
            Some(self.engine.api_key.clone())
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// Socket address string for the gateway listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}
