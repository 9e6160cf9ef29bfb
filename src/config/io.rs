//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;

use secrecy::SecretString;

use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file (config.json / config.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
///
/// `.env` is read before the config path is resolved, so it may set
/// `SEARCHGRAPH_CONFIG` or `SEARCHGRAPH_CONFIG_DIR`.
pub fn load_config() -> Result<Config> {
    dotenvy::dotenv().ok();
    load_config_with(|key| std::env::var(key).ok())
}

/// Resolve the config file and apply overrides from one variable source
pub(crate) fn load_config_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let config_path = super::paths::config_path_with(&lookup);

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    apply_overrides(&mut config, lookup);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads `.env` first, then overlays any set variables. Env vars have the
/// highest precedence: defaults < file < env.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Overlay values from `lookup` onto `config`
pub(crate) fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    // Inference provider
    if let Some(key) = lookup("LLM_API_KEY").or_else(|| lookup("GROQ_API_KEY")) {
        config.llm.api_key = SecretString::from(key);
    }
    if let Some(model) = lookup("LLM_MODEL") {
        config.llm.model = model;
    }
    if let Some(url) = lookup("LLM_BASE_URL") {
        config.llm.base_url = url;
    }
    if let Some(v) = lookup("LLM_TIMEOUT").and_then(|s| s.parse().ok()) {
        config.llm.timeout_secs = v;
    }

    // Search
    if let Some(key) = lookup("TAVILY_API_KEY") {
        config.search.api_key = SecretString::from(key);
    }
    if let Some(url) = lookup("TAVILY_BASE_URL") {
        config.search.base_url = url;
    }
    if let Some(depth) = lookup("TAVILY_SEARCH_DEPTH").and_then(|s| s.parse().ok()) {
        config.search.search_depth = depth;
    }
    if let Some(v) = lookup("TAVILY_MAX_RESULTS").and_then(|s| s.parse().ok()) {
        config.search.max_results = v;
    }

    // Agent
    if let Some(prompt) = lookup("AGENT_SYSTEM_PROMPT") {
        config.agent.system_prompt = Some(prompt).filter(|p| !p.is_empty());
    }
    if let Some(v) = lookup("AGENT_MAX_ITERATIONS").and_then(|s| s.parse().ok()) {
        config.agent.max_iterations = Some(v);
    }

    // Server
    if let Some(host) = lookup("SERVER_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("SERVER_PORT").and_then(|s| s.parse().ok()) {
        config.server.port = port;
    }

    // Logging
    if let Some(level) = lookup("RUST_LOG") {
        config.log.level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT").and_then(|s| s.parse().ok()) {
        config.log.format = format;
    }
}

/// Save configuration to a file (API keys are never written)
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}
