//! Loop controller - drives reasoning and tool execution to completion
//!
//! ```text
//!   Reasoning --(tool requests)--> Executing --(always)--> Reasoning
//!       \
//!        `--(final answer)--> Terminal
//! ```
//!
//! The checkpoint store is consulted once when a run starts and written once
//! when it finishes. A failed run leaves the stored checkpoint untouched.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agent::conversation::ConversationState;
use crate::agent::executor::{ExecutedCall, ToolExecutor, UnregisteredCall, UnregisteredPolicy};
use crate::agent::reasoner::Reasoner;
use crate::agent::router::{route, Route};
use crate::agent::types::{GenerationOptions, Message, ToolInvocation, Usage};
use crate::config::AgentConfig;
use crate::core::{ChatModel, CheckpointStore};
use crate::error::{Error, Result};
use crate::tools::ToolRegistry;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Position of the loop controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Reasoning,
    Executing,
    Terminal,
}

impl LoopState {
    /// The only transitions the controller makes
    fn next(self, route: Route) -> LoopState {
        match (self, route) {
            (LoopState::Reasoning, Route::ToolExecutor) => LoopState::Executing,
            (LoopState::Reasoning, Route::Terminate) => LoopState::Terminal,
            (LoopState::Executing, _) => LoopState::Reasoning,
            (LoopState::Terminal, _) => LoopState::Terminal,
        }
    }
}

// ---------------------------------------------------------------------------
// Callback trait
// ---------------------------------------------------------------------------

/// Hooks into loop events (streaming progress, printing search activity, ...)
#[async_trait]
pub trait LoopCallback: Send + Sync {
    /// Called before each inference call.
    async fn on_reasoning_start(&self, _iteration: u32) {}
    /// Called with each assistant message as it is appended.
    async fn on_assistant_message(&self, _message: &Message) {}
    /// Called for each request that resolved to a registered capability, before it runs.
    async fn on_tool_invocation(&self, _invocation: &ToolInvocation) {}
    /// Called for each executed request once the step has joined.
    async fn on_tool_result(&self, _call: &ExecutedCall) {}
    /// Called for each request naming an unregistered capability.
    async fn on_unregistered(&self, _call: &UnregisteredCall) {}
    /// Called once after the loop reaches Terminal.
    async fn on_complete(&self, _output: &RunOutput) {}
}

/// Default no-op callback.
pub struct NoOpCallback;

#[async_trait]
impl LoopCallback for NoOpCallback {}

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Everything a run needs: model, capabilities and the session store
#[derive(Clone)]
pub struct RunContext {
    reasoner: Reasoner,
    executor: ToolExecutor,
    checkpoints: Arc<dyn CheckpointStore>,
    max_iterations: Option<u32>,
}

impl RunContext {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolRegistry>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        RunContext {
            reasoner: Reasoner::new(model, &tools),
            executor: ToolExecutor::new(tools),
            checkpoints,
            max_iterations: None,
        }
    }

    /// Build a context with the agent settings from configuration applied
    pub fn from_config(
        config: &AgentConfig,
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolRegistry>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        let mut context = Self::new(model, tools, checkpoints)
            .with_options(config.generation.clone())
            .with_unregistered_policy(config.unregistered_policy);
        if let Some(prompt) = &config.system_prompt {
            context = context.with_system_prompt(prompt.clone());
        }
        if let Some(limit) = config.max_iterations {
            context = context.with_max_iterations(limit);
        }
        context
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.reasoner = self.reasoner.with_system_prompt(prompt);
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.reasoner = self.reasoner.with_options(options);
        self
    }

    pub fn with_unregistered_policy(mut self, policy: UnregisteredPolicy) -> Self {
        self.executor = self.executor.with_policy(policy);
        self
    }

    /// Abort with `Error::IterationLimit` after `limit` reasoning steps
    pub fn with_max_iterations(mut self, limit: u32) -> Self {
        self.max_iterations = Some(limit);
        self
    }
}

/// Non-message outcome of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Reasoning steps taken
    pub iterations: u32,
    /// Requests dispatched to a handler
    pub tool_calls: u32,
    /// Requests naming an unregistered capability, in the order seen
    pub unregistered: Vec<UnregisteredCall>,
    /// Token usage summed over all inference calls
    pub usage: Usage,
    pub duration_ms: u64,
}

/// Final conversation plus the run report
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub session_id: String,
    pub state: ConversationState,
    pub report: RunReport,
}

impl RunOutput {
    /// Text of the final assistant message
    pub fn answer(&self) -> Option<&str> {
        self.state.final_answer()
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run one turn for `session_id`: resume, append `input`, loop, save.
pub async fn run(
    ctx: &RunContext,
    session_id: &str,
    input: Vec<Message>,
) -> Result<RunOutput> {
    run_with_callback(ctx, session_id, input, &NoOpCallback).await
}

/// Like [`run`], reporting progress to `callback`.
pub async fn run_with_callback(
    ctx: &RunContext,
    session_id: &str,
    input: Vec<Message>,
    callback: &dyn LoopCallback,
) -> Result<RunOutput> {
    let mut state = match ctx.checkpoints.load(session_id).await? {
        Some(checkpoint) => {
            info!(
                "Resuming session {} from checkpoint ({} messages)",
                session_id,
                checkpoint.state.len()
            );
            checkpoint.state
        }
        None => {
            info!("Starting new session {}", session_id);
            ConversationState::new()
        }
    };
    state.extend(input);
    if state.is_empty() {
        return Err(Error::InvalidInput(
            "conversation has no messages to respond to".to_string(),
        ));
    }

    let (state, report) = drive(ctx, state, callback).await?;

    ctx.checkpoints.save(session_id, &state).await?;

    let output = RunOutput {
        session_id: session_id.to_string(),
        state,
        report,
    };
    callback.on_complete(&output).await;
    Ok(output)
}

/// Drive the state machine from Reasoning to Terminal
async fn drive(
    ctx: &RunContext,
    mut state: ConversationState,
    callback: &dyn LoopCallback,
) -> Result<(ConversationState, RunReport)> {
    let start = Instant::now();
    let mut report = RunReport::default();
    let mut current = LoopState::Reasoning;

    loop {
        match current {
            LoopState::Reasoning => {
                if let Some(limit) = ctx.max_iterations {
                    if report.iterations >= limit {
                        warn!("Agent loop exceeded max iterations ({})", limit);
                        return Err(Error::IterationLimit(limit));
                    }
                }
                report.iterations += 1;
                info!("Agent loop iteration {}", report.iterations);
                callback.on_reasoning_start(report.iterations).await;

                let reply = ctx.reasoner.infer(&state).await?;
                if let Some(usage) = &reply.usage {
                    report.usage.accumulate(usage);
                }
                callback.on_assistant_message(&reply.message).await;
                state.push(reply.message);

                current = current.next(route(&state));
            }
            LoopState::Executing => {
                let invocations = state
                    .last()
                    .map(|m| m.tool_calls.clone())
                    .unwrap_or_default();

                for invocation in &invocations {
                    if ctx.executor.capability_for(&invocation.name).is_some() {
                        callback.on_tool_invocation(invocation).await;
                    }
                }

                let step = ctx.executor.execute(&invocations).await?;

                for call in &step.executed {
                    callback.on_tool_result(call).await;
                }
                for call in &step.unregistered {
                    callback.on_unregistered(call).await;
                }
                report.tool_calls += step.executed.len() as u32;
                report.unregistered.extend(step.unregistered);

                let appended = state.extend(step.messages);
                debug!("Appended {} tool result(s)", appended);

                current = current.next(Route::ToolExecutor);
            }
            LoopState::Terminal => break,
        }
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Agent loop finished: iterations={}, tool_calls={}, unregistered={}, duration={}ms",
        report.iterations,
        report.tool_calls,
        report.unregistered.len(),
        report.duration_ms
    );

    Ok((state, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(
            LoopState::Reasoning.next(Route::ToolExecutor),
            LoopState::Executing
        );
        assert_eq!(LoopState::Reasoning.next(Route::Terminate), LoopState::Terminal);
        assert_eq!(LoopState::Executing.next(Route::Terminate), LoopState::Reasoning);
        assert_eq!(
            LoopState::Executing.next(Route::ToolExecutor),
            LoopState::Reasoning
        );
        assert_eq!(LoopState::Terminal.next(Route::ToolExecutor), LoopState::Terminal);
    }
}
