//! Reasoner - one inference step over the conversation
//!
//! Sends the conversation (with the configured system prompt in front) to
//! the chat model together with the registered capability schemas, and
//! hands back the single assistant message the model produced.

use std::sync::Arc;

use tracing::{debug, info};

use crate::agent::conversation::ConversationState;
use crate::agent::types::{GenerationOptions, Message, Role, ToolDefinition};
use crate::core::{ChatModel, ModelReply};
use crate::error::Result;
use crate::tools::ToolRegistry;

/// Produces the next assistant message for a conversation
#[derive(Clone)]
pub struct Reasoner {
    model: Arc<dyn ChatModel>,
    definitions: Vec<ToolDefinition>,
    options: GenerationOptions,
    system_prompt: Option<String>,
}

impl Reasoner {
    /// Create a reasoner that advertises every capability in `tools`
    pub fn new(model: Arc<dyn ChatModel>, tools: &ToolRegistry) -> Self {
        Reasoner {
            model,
            definitions: tools.definitions(),
            options: GenerationOptions::default(),
            system_prompt: None,
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Prepend `prompt` to every request; it is never written into the conversation
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Produce exactly one assistant message for the current conversation
    pub async fn reason(&self, state: &ConversationState) -> Result<Message> {
        self.infer(state).await.map(|reply| reply.message)
    }

    /// Like [`Reasoner::reason`], keeping the finish reason and token usage
    pub async fn infer(&self, state: &ConversationState) -> Result<ModelReply> {
        let messages = self.request_messages(state);

        info!(
            "Calling {} with {} messages and {} tools",
            self.model.model_name(),
            messages.len(),
            self.definitions.len()
        );

        let mut reply = self
            .model
            .complete(&messages, &self.definitions, &self.options)
            .await?;
        reply.message.role = Role::Assistant;

        info!(
            "Model finish_reason: {}, has_content: {}, tool_calls: {}",
            reply.finish_reason.as_deref().unwrap_or("unknown"),
            !reply.message.content.is_empty(),
            reply.message.tool_calls.len()
        );
        if !reply.message.content.is_empty() {
            debug!("Assistant: {}", truncate(&reply.message.content, 500));
        }

        Ok(reply)
    }

    fn request_messages(&self, state: &ConversationState) -> Vec<Message> {
        let mut messages = Vec::with_capacity(state.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.extend_from_slice(state.messages());
        messages
    }
}

/// Truncate to at most `max` bytes without splitting a character
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
