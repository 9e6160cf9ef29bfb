//! Search capability configuration (Tavily)

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How thorough a Tavily search is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

impl std::str::FromStr for SearchDepth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(SearchDepth::Basic),
            "advanced" => Ok(SearchDepth::Advanced),
            _ => Err(Error::Config(format!(
                "Invalid search depth: {}. Valid options: basic, advanced",
                s
            ))),
        }
    }
}

impl std::fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchDepth::Basic => write!(f, "basic"),
            SearchDepth::Advanced => write!(f, "advanced"),
        }
    }
}

/// Tavily search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilyConfig {
    /// API key
    #[serde(skip_serializing, default = "default_secret")]
    pub api_key: SecretString,
    /// Base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default search depth when the model does not pick one
    #[serde(default)]
    pub search_depth: SearchDepth,
    /// Maximum results per search
    #[serde(default = "default_max_results")]
    pub max_results: u8,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for TavilyConfig {
    fn default() -> Self {
        TavilyConfig {
            api_key: default_secret(),
            base_url: default_base_url(),
            search_depth: SearchDepth::default(),
            max_results: default_max_results(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

fn default_base_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_max_results() -> u8 {
    5
}

fn default_timeout() -> u64 {
    30
}
