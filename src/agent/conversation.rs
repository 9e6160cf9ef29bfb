//! Conversation state
//!
//! The message history shared between the reasoner and the tool executor.
//! It is append-only: there is no API that removes or reorders messages.

use crate::agent::types::{Message, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered, append-only message history for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation seeded with a single user message
    pub fn from_user(content: impl Into<String>) -> Self {
        let mut state = Self::new();
        state.push(Message::user(content));
        state
    }

    /// Append one message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append messages in order, returning how many were added
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) -> usize {
        let before = self.messages.len();
        self.messages.extend(messages);
        self.messages.len() - before
    }

    /// The latest message, if any
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// All messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if conversation is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the last assistant message, if any
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
    }

    /// Final answer text: the content of the last assistant message
    pub fn final_answer(&self) -> Option<&str> {
        self.last_assistant_message()
            .filter(|m| !m.has_tool_calls())
            .map(|m| m.content.as_str())
    }
}

impl From<Vec<Message>> for ConversationState {
    fn from(messages: Vec<Message>) -> Self {
        ConversationState { messages }
    }
}

/// A persisted snapshot of a conversation keyed by session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Session / thread identifier
    pub session_id: String,
    /// Snapshot of the conversation
    pub state: ConversationState,
    /// When the session was first saved
    pub created_at: DateTime<Utc>,
    /// When the session was last saved
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(session_id: impl Into<String>, state: ConversationState) -> Self {
        let now = Utc::now();
        Checkpoint {
            session_id: session_id.into(),
            state,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::ToolInvocation;

    #[test]
    fn test_conversation_creation() {
        let state = ConversationState::from_user("What is the weather in ap?");
        assert_eq!(state.len(), 1);
        assert_eq!(state.messages()[0].role, Role::User);
        assert!(ConversationState::new().is_empty());
    }

    #[test]
    fn test_append_only_growth() {
        let mut state = ConversationState::from_user("Hello");
        let snapshot = state.messages().to_vec();

        let added = state.extend(vec![
            Message::tool_result("a", "search", "x"),
            Message::tool_result("b", "search", "y"),
        ]);
        assert_eq!(added, 2);
        assert_eq!(state.len(), 3);
        assert_eq!(&state.messages()[..1], snapshot.as_slice());

        assert_eq!(state.extend(Vec::new()), 0);
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn test_final_answer_ignores_tool_call_messages() {
        let mut state = ConversationState::from_user("q");
        state.push(Message::assistant_with_tool_calls(
            "",
            vec![ToolInvocation::new("1", "search", serde_json::json!({}))],
        ));
        assert!(state.final_answer().is_none());

        state.push(Message::assistant("done"));
        assert_eq!(state.final_answer(), Some("done"));
    }
}
