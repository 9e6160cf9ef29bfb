//! Core module - service boundaries
//!
//! - `ChatModel`: the inference service
//! - `CheckpointStore`: conversation persistence keyed by session

pub mod provider;
pub mod storage;

pub use provider::{ChatModel, ModelReply};
pub use storage::{CheckpointStore, InMemoryCheckpointStore};
