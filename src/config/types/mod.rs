//! Configuration types module

pub mod provider;
pub mod search;

use serde::{Deserialize, Serialize};

use crate::agent::{GenerationOptions, UnregisteredPolicy};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Inference provider configuration
    #[serde(default)]
    pub llm: provider::LlmConfig,

    /// Search capability configuration
    #[serde(default)]
    pub search: search::TavilyConfig,

    /// Streaming server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from defaults, the config file and the environment
    pub fn from_env() -> crate::error::Result<Self> {
        crate::config::load_config()
    }
}

/// Agent-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Optional system prompt prepended to every inference request
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Optional guard on reasoning iterations (unbounded when unset)
    #[serde(default)]
    pub max_iterations: Option<u32>,
    /// What to do with requests naming an unregistered capability
    #[serde(default)]
    pub unregistered_policy: UnregisteredPolicy,
    /// Sampling options for the reasoner
    #[serde(default = "GenerationOptions::balanced")]
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            system_prompt: None,
            max_iterations: None,
            unregistered_policy: UnregisteredPolicy::default(),
            generation: GenerationOptions::balanced(),
        }
    }
}

/// Streaming server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid log format: {}. Valid options: pretty, json",
                s
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter (used when RUST_LOG is unset)
    #[serde(default = "default_level")]
    pub level: String,
    /// Log format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info,searchgraph=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert!(config.agent.max_iterations.is_none());
        assert_eq!(config.agent.unregistered_policy, UnregisteredPolicy::Report);
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.agent.generation, GenerationOptions::balanced());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config =
            json5::from_str("{ agent: { max_iterations: 4 }, server: { port: 9000 } }").unwrap();
        assert_eq!(config.agent.max_iterations, Some(4));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.agent.generation.temperature, Some(0.5));
    }

    #[test]
    fn test_explicit_generation_replaces_balanced() {
        let config: Config =
            json5::from_str("{ agent: { generation: { max_tokens: 256 } } }").unwrap();
        assert_eq!(config.agent.generation.max_tokens, Some(256));
        assert!(config.agent.generation.temperature.is_none());
    }
}
