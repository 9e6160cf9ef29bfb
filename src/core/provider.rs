//! Chat model trait - the inference service boundary
//!
//! The reasoner only depends on `ChatModel`, so the hosted
//! chat-completions client can be swapped for a scripted model in tests.

use async_trait::async_trait;

use crate::agent::types::{GenerationOptions, Message, ToolDefinition, Usage};
use crate::error::Result;

/// One assistant turn returned by a chat model
#[derive(Debug, Clone)]
pub struct ModelReply {
    /// The assistant message (content and/or tool invocations)
    pub message: Message,
    /// Finish reason reported by the service (stop, tool_calls, ...)
    pub finish_reason: Option<String>,
    /// Token usage, when the service reports it
    pub usage: Option<Usage>,
}

impl ModelReply {
    pub fn new(message: Message) -> Self {
        ModelReply {
            message,
            finish_reason: None,
            usage: None,
        }
    }
}

/// Abstract interface for a tool-calling chat model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier used for requests
    fn model_name(&self) -> &str;

    /// Complete the conversation, advertising `tools` to the model
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &GenerationOptions,
    ) -> Result<ModelReply>;
}
