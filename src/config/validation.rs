//! Configuration validation
//!
//! Validates configuration and reports issues.

use secrecy::ExposeSecret;

use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_llm_config(config, result);
    result = validate_search_config(config, result);
    result = validate_agent_config(config, result);

    result
}

fn validate_llm_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.llm.api_key.expose_secret().is_empty() {
        result = result.with_error(
            ValidationIssue::new("llm.api_key", "No inference API key configured")
                .with_suggestion("Set GROQ_API_KEY (or LLM_API_KEY) in the environment or .env"),
        );
    }

    if !config.llm.base_url.starts_with("http://") && !config.llm.base_url.starts_with("https://") {
        result = result.with_error(ValidationIssue::new(
            "llm.base_url",
            format!("Base URL is not an http(s) URL: {}", config.llm.base_url),
        ));
    }

    result
}

fn validate_search_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.search.api_key.expose_secret().is_empty() {
        result = result.with_error(
            ValidationIssue::new("search.api_key", "No Tavily API key configured")
                .with_suggestion("Set TAVILY_API_KEY in the environment or .env"),
        );
    }

    if config.search.max_results == 0 {
        result = result.with_warning(
            ValidationIssue::new("search.max_results", "Searches will return no results")
                .with_suggestion("Set search.max_results to at least 1"),
        );
    }

    result
}

fn validate_agent_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.agent.max_iterations == Some(0) {
        result = result.with_error(
            ValidationIssue::new("agent.max_iterations", "Agent would never reach the model")
                .with_suggestion("Remove the limit or set it to at least 1"),
        );
    }

    if config.agent.max_iterations.is_none() {
        result = result.with_warning(ValidationIssue::new(
            "agent.max_iterations",
            "No iteration limit set; a model that keeps requesting tools will loop indefinitely",
        ));
    }

    result
}
