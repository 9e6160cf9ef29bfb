//! Routing decision after each reasoning step

use crate::agent::conversation::ConversationState;

/// Where control goes after the reasoner has spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The latest message requests at least one tool invocation
    ToolExecutor,
    /// Nothing left to do
    Terminate,
}

/// Decide the next step from the latest message.
///
/// Only the last message is consulted; earlier tool requests that have
/// already been answered never cause another execution.
pub fn route(state: &ConversationState) -> Route {
    match state.last() {
        Some(message) if message.has_tool_calls() => Route::ToolExecutor,
        _ => Route::Terminate,
    }
}
