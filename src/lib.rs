//! # searchgraph
//!
//! A minimal tool-using conversational agent: a language model that can
//! call a web search capability, driven by a small reasoning / execution loop.
//!
//! ## Features
//!
//! - **Reasoner:** any OpenAI-compatible chat completions service (Groq by default)
//! - **Web search:** Tavily, exposed to the model as `tavily_search_results_json`
//! - **Checkpoints:** conversations resume by session id
//! - **Streaming server:** progress and answers as Server-Sent Events

pub mod agent;
pub mod config;
pub mod core;
pub mod error;
pub mod tools;

pub use agent::{run, run_with_callback, ConversationState, Message, RunContext, RunOutput};
pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
