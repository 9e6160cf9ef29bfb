//! Checkpoint storage - persistence boundary for conversation state
//!
//! The loop consults the store exactly twice per run: once at entry to
//! resume a session and once at exit to persist it. Backends only need to
//! honour a load/save contract keyed by session id.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::agent::{Checkpoint, ConversationState};
use crate::error::Result;

/// Abstract interface for checkpoint persistence
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the checkpoint for a session, if one exists
    async fn load(&self, key: &str) -> Result<Option<Checkpoint>>;

    /// Save (overwrite) the checkpoint for a session
    async fn save(&self, key: &str, state: &ConversationState) -> Result<()>;
}

/// Process-local checkpoint store
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    checkpoints: RwLock<HashMap<String, Checkpoint>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-session lock for callers that must serialize runs on one session.
    ///
    /// Locks nobody else holds are dropped from the table on each call.
    pub async fn session_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.checkpoints.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.checkpoints.read().await.is_empty()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, key: &str) -> Result<Option<Checkpoint>> {
        Ok(self.checkpoints.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, state: &ConversationState) -> Result<()> {
        let mut checkpoints = self.checkpoints.write().await;
        match checkpoints.get_mut(key) {
            Some(existing) => {
                existing.state = state.clone();
                existing.updated_at = chrono::Utc::now();
            }
            None => {
                checkpoints.insert(key.to_string(), Checkpoint::new(key, state.clone()));
            }
        }
        tracing::debug!("Saved checkpoint for session {} ({} messages)", key, state.len());
        Ok(())
    }
}
