//! Core tool trait and result types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::types::{FunctionDefinition, ToolDefinition};
use crate::error::Result;

/// A capability handler that can be called by the LLM
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name (must match a `Capability` name to be registered)
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// Get the JSON Schema for tool parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with given arguments.
    ///
    /// Failures of the backing service are returned as `Err` and abort the run.
    async fn execute(&self, args: Value) -> Result<ToolResult>;

    /// Convert to a chat-completions tool definition
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters_schema(),
            },
        }
    }
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Textual output handed back to the model
    pub content: String,
    /// Structured data for observers (e.g. result URLs); never sent to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ToolResult {
    /// Create a plain result
    pub fn success(content: impl Into<String>) -> Self {
        ToolResult {
            content: content.into(),
            metadata: None,
        }
    }

    /// Create a result with structured metadata
    pub fn success_with_metadata(content: impl Into<String>, metadata: Value) -> Self {
        ToolResult {
            content: content.into(),
            metadata: Some(metadata),
        }
    }

    /// URLs listed in the metadata, if any
    pub fn urls(&self) -> Vec<String> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("urls"))
            .and_then(|v| v.as_array())
            .map(|urls| {
                urls.iter()
                    .filter_map(|u| u.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Display for ToolResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.content)
    }
}
