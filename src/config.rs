//! Layered configuration: environment variables (via `dotenvy`), optionally
//! overlaid with a TOML file, env taking precedence.

use crate::error::{Error, Result};
#[cfg(feature = "rig-provider")]
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level ReAct engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_iters")]
    pub max_iters: usize,
    #[serde(default)]
    pub structured_output_strategy: StructuredOutputStrategyConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            max_iters: default_max_iters(),
            structured_output_strategy: StructuredOutputStrategyConfig::default(),
        }
    }
}

fn default_max_iters() -> usize {
    10
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuredOutputStrategyConfig {
    #[default]
    ToolChoice,
    Reminder,
}

impl From<StructuredOutputStrategyConfig> for crate::structured_output::Strategy {
    fn from(value: StructuredOutputStrategyConfig) -> Self {
        match value {
            StructuredOutputStrategyConfig::ToolChoice => crate::structured_output::Strategy::ToolChoice,
            StructuredOutputStrategyConfig::Reminder => crate::structured_output::Strategy::Reminder,
        }
    }
}

/// The example rig-core provider's settings. Only meaningful with the
/// `rig-provider` feature; the core engine never reads this.
#[cfg(feature = "rig-provider")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(skip_serializing, default = "default_secret")]
    pub api_key: SecretString,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[cfg(feature = "rig-provider")]
impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            api_key: default_secret(),
            default_model: default_model(),
            timeout_secs: default_timeout(),
        }
    }
}

#[cfg(feature = "rig-provider")]
fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

#[cfg(feature = "rig-provider")]
fn default_model() -> String {
    "anthropic/claude-sonnet-4".to_string()
}

#[cfg(feature = "rig-provider")]
fn default_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[cfg(feature = "rig-provider")]
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Loads from `path` if it exists (TOML), else from environment variables.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) if p.exists() => load_config_from_path(p),
        _ => load_config_from_env(),
    }
}

pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read config file {}: {}", path.display(), e)))?;
    let mut config: Config =
        toml::from_str(&content).map_err(|e| Error::Config(format!("invalid TOML config: {}", e)))?;
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn load_config_from_env() -> Result<Config> {
    dotenvy::dotenv().ok();
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Environment variables always win over file contents.
pub fn apply_env_overrides(config: &mut Config) {
    #[cfg(feature = "rig-provider")]
    {
        if let Ok(api_key) = std::env::var("OPENROUTER_API_KEY") {
            config.provider.api_key = SecretString::from(api_key);
        }
        if let Ok(model) = std::env::var("DEFAULT_MODEL").or_else(|_| std::env::var("OPENROUTER_MODEL")) {
            config.provider.default_model = model;
        }
        if let Ok(timeout) = std::env::var("OPENROUTER_TIMEOUT") {
            if let Ok(timeout) = timeout.parse() {
                config.provider.timeout_secs = timeout;
            }
        }
    }
    if let Ok(max_iters) = std::env::var("AGENT_MAX_ITERS") {
        if let Ok(max_iters) = max_iters.parse() {
            config.agent.max_iters = max_iters;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_defaults() {
        let config = Config::default();
        assert_eq!(config.agent.max_iters, 10);
        #[cfg(feature = "rig-provider")]
        assert_eq!(config.provider.default_model, "anthropic/claude-sonnet-4");
    }

    #[test]
    fn env_override_takes_precedence_over_file_value() {
        std::env::set_var("AGENT_MAX_ITERS", "3");
        let mut config = Config::default();
        apply_env_overrides(&mut config);
        assert_eq!(config.agent.max_iters, 3);
        std::env::remove_var("AGENT_MAX_ITERS");
    }
}
