//! Error types for searchgraph

use thiserror::Error;

/// Result type alias using searchgraph's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for searchgraph
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The language-model completion call failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// A capability (web search) call failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// The optional iteration guard was exceeded
    #[error("Agent loop exceeded {0} iterations")]
    IterationLimit(u32),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Check if error is retryable.
    ///
    /// Informational only: the agent loop never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Config(_))
    }

    /// Whether the error came from the search capability rather than the model
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, Error::ToolExecution(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(!Error::Inference("boom".into()).is_retryable());
        assert!(Error::InvalidInput("missing query".into()).is_client_error());
        assert!(Error::ToolExecution("search down".into()).is_tool_failure());
        assert!(!Error::Inference("boom".into()).is_tool_failure());
    }

    #[test]
    fn test_error_display() {
        let err = Error::IterationLimit(5);
        assert_eq!(err.to_string(), "Agent loop exceeded 5 iterations");
    }
}
