//! Configuration module
//!
//! - types/mod.rs: Core configuration types (Config, AgentConfig, ServerConfig, LogConfig)
//! - types/provider.rs: Inference provider configuration
//! - types/search.rs: Search capability configuration
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

pub use types::{AgentConfig, Config, LogConfig, LogFormat, ServerConfig};
pub use types::provider::LlmConfig;
pub use types::search::{SearchDepth, TavilyConfig};

pub use io::{apply_env_overrides, load_config, load_config_from_path, save_config};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
