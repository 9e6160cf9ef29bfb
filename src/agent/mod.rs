//! Agent module - the reasoning / tool-execution loop
//!
//! - `types`: messages, tool invocations and the chat-completions wire format
//! - `conversation`: append-only conversation state and checkpoints
//! - `client`: OpenAI-compatible chat completions client (Groq by default)
//! - `reasoner`: one inference step
//! - `router`: the routing decision after each step
//! - `executor`: runs requested tool invocations
//! - `graph`: the loop controller and the `run` entry point

mod client;
mod conversation;
mod executor;
mod graph;
mod reasoner;
mod router;
pub mod types;

pub use client::ChatCompletionsClient;
pub use conversation::{Checkpoint, ConversationState};
pub use executor::{ExecutedCall, ExecutionReport, ToolExecutor, UnregisteredCall, UnregisteredPolicy};
pub use graph::{
    run, run_with_callback, LoopCallback, LoopState, NoOpCallback, RunContext, RunOutput,
    RunReport,
};
pub use reasoner::Reasoner;
pub use router::{route, Route};
pub use types::*;
