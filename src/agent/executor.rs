//! Tool executor - runs the invocations requested by the latest assistant message
//!
//! Every request name is resolved through the registry. Matched requests
//! run concurrently and are joined before returning; the resulting tool
//! messages keep the order of the requests. Requests naming a capability
//! that is not registered never reach a handler and are reported instead.

use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::reasoner::truncate;
use crate::agent::types::{Message, ToolInvocation};
use crate::error::{Error, Result};
use crate::tools::{Capability, Resolution, ToolRegistry, ToolResult};

/// What to do with requests that name no registered capability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnregisteredPolicy {
    /// Append nothing; only list the request in the report
    #[default]
    Report,
    /// Also append an error tool-result message so the model sees the failure
    Respond,
}

/// A request that named an unregistered capability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnregisteredCall {
    pub id: String,
    pub name: String,
}

impl From<&ToolInvocation> for UnregisteredCall {
    fn from(invocation: &ToolInvocation) -> Self {
        UnregisteredCall {
            id: invocation.id.clone(),
            name: invocation.name.clone(),
        }
    }
}

/// A request that was dispatched to a handler
#[derive(Debug, Clone)]
pub struct ExecutedCall {
    pub invocation: ToolInvocation,
    pub capability: Capability,
    pub result: ToolResult,
    pub duration_ms: u64,
}

/// Outcome of one executor step
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// Tool-result messages to append, in request order
    pub messages: Vec<Message>,
    /// Requests that reached a handler, in request order
    pub executed: Vec<ExecutedCall>,
    /// Requests naming an unregistered capability, in request order
    pub unregistered: Vec<UnregisteredCall>,
}

enum Outcome {
    Executed(ExecutedCall),
    Unregistered(UnregisteredCall),
}

/// Executes tool invocation requests against a registry
#[derive(Clone)]
pub struct ToolExecutor {
    tools: Arc<ToolRegistry>,
    policy: UnregisteredPolicy,
}

impl ToolExecutor {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        ToolExecutor {
            tools,
            policy: UnregisteredPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UnregisteredPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Capability a request name resolves to, if any
    pub fn capability_for(&self, name: &str) -> Option<Capability> {
        match self.tools.resolve(name) {
            Resolution::Registered { capability, .. } => Some(capability),
            Resolution::Unregistered => None,
        }
    }

    /// Run every request and collect the results.
    ///
    /// Fails with `Error::ToolExecution` if any handler fails; no result
    /// messages are returned in that case.
    pub async fn execute(&self, invocations: &[ToolInvocation]) -> Result<ExecutionReport> {
        info!("Executing {} tool invocation(s)", invocations.len());

        let outcomes = try_join_all(invocations.iter().map(|invocation| self.dispatch(invocation))).await?;

        let mut report = ExecutionReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Executed(call) => {
                    report.messages.push(Message::tool_result(
                        &call.invocation.id,
                        call.capability.name(),
                        call.result.to_string(),
                    ));
                    report.executed.push(call);
                }
                Outcome::Unregistered(call) => {
                    if self.policy == UnregisteredPolicy::Respond {
                        report.messages.push(Message::tool_result(
                            &call.id,
                            &call.name,
                            format!("Error: '{}' is not an available tool", call.name),
                        ));
                    }
                    report.unregistered.push(call);
                }
            }
        }

        Ok(report)
    }

    async fn dispatch(&self, invocation: &ToolInvocation) -> Result<Outcome> {
        let (capability, tool) = match self.tools.resolve(&invocation.name) {
            Resolution::Registered { capability, tool } => (capability, tool),
            Resolution::Unregistered => {
                warn!(
                    "Model requested unregistered tool '{}' (call {})",
                    invocation.name, invocation.id
                );
                return Ok(Outcome::Unregistered(invocation.into()));
            }
        };

        info!("Executing tool: {} (call {})", capability, invocation.id);
        debug!("Tool {} arguments: {}", capability, invocation.arguments);

        let start = Instant::now();
        let result = tool.execute(invocation.arguments.clone()).await.map_err(|e| {
            warn!("Tool {} failed: {}", capability, e);
            match e {
                Error::ToolExecution(msg) => Error::ToolExecution(msg),
                other => Error::ToolExecution(format!("{}: {}", capability, other)),
            }
        })?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let content = result.to_string();
        info!(
            "Tool {} succeeded in {}ms, result length: {} chars",
            capability,
            duration_ms,
            content.len()
        );
        debug!("Tool {} result: {}", capability, truncate(&content, 1000));

        Ok(Outcome::Executed(ExecutedCall {
            invocation: invocation.clone(),
            capability,
            result,
            duration_ms,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::Role;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::time::Duration;

    /// Echoes the query back; slower for shorter queries so completion
    /// order differs from request order
    struct EchoSearch;

    #[async_trait]
    impl Tool for EchoSearch {
        fn name(&self) -> &str {
            "tavily_search_results_json"
        }
        fn description(&self) -> &str {
            "Search the web"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: Value) -> Result<ToolResult> {
            let query = args["query"].as_str().unwrap_or_default().to_string();
            if query == "fail" {
                return Err(Error::ToolExecution("search service unavailable".into()));
            }
            let delay = 30u64.saturating_sub(query.len() as u64 * 5);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(ToolResult::success_with_metadata(
                format!("results for {}", query),
                json!({"urls": [format!("https://example.com/{}", query)]}),
            ))
        }
    }

    fn executor() -> ToolExecutor {
        ToolExecutor::new(Arc::new(ToolRegistry::new().with(EchoSearch).unwrap()))
    }

    fn search(id: &str, query: &str) -> ToolInvocation {
        ToolInvocation::new(id, "tavily_search_results_json", json!({ "query": query }))
    }

    #[tokio::test]
    async fn test_one_result_per_matched_request_in_order() {
        let calls = vec![search("a", "x"), search("b", "longer"), search("c", "yy")];
        let report = executor().execute(&calls).await.unwrap();

        assert_eq!(report.messages.len(), 3);
        let ids: Vec<_> = report
            .messages
            .iter()
            .map(|m| m.tool_call_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(report.messages.iter().all(|m| m.role == Role::Tool));
        assert_eq!(report.messages[1].content, "results for longer");
        assert_eq!(
            report.messages[0].name.as_deref(),
            Some("tavily_search_results_json")
        );
        assert!(report.unregistered.is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_is_reported_not_answered() {
        let calls = vec![ToolInvocation::new("c1", "calculator", json!({"expression": "2+2"}))];
        let report = executor().execute(&calls).await.unwrap();

        assert!(report.messages.is_empty());
        assert!(report.executed.is_empty());
        assert_eq!(
            report.unregistered,
            vec![UnregisteredCall {
                id: "c1".into(),
                name: "calculator".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_mixed_requests() {
        let calls = vec![
            search("a", "x"),
            ToolInvocation::new("b", "calculator", json!({})),
            search("c", "z"),
        ];
        let report = executor().execute(&calls).await.unwrap();

        let ids: Vec<_> = report
            .messages
            .iter()
            .map(|m| m.tool_call_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(report.unregistered.len(), 1);
        assert_eq!(report.executed[1].result.urls(), vec!["https://example.com/z"]);
    }

    #[tokio::test]
    async fn test_respond_policy_appends_error_message() {
        let calls = vec![
            ToolInvocation::new("b", "calculator", json!({})),
            search("a", "x"),
        ];
        let report = executor()
            .with_policy(UnregisteredPolicy::Respond)
            .execute(&calls)
            .await
            .unwrap();

        assert_eq!(report.messages.len(), 2);
        assert_eq!(report.messages[0].tool_call_id.as_deref(), Some("b"));
        assert!(report.messages[0].content.contains("calculator"));
        assert_eq!(report.messages[1].tool_call_id.as_deref(), Some("a"));
        assert_eq!(report.unregistered.len(), 1);
    }

    #[tokio::test]
    async fn test_search_failure_aborts_step() {
        let calls = vec![search("a", "x"), search("b", "fail")];
        let err = executor().execute(&calls).await.unwrap_err();
        assert!(err.is_tool_failure());
    }

    #[tokio::test]
    async fn test_empty_request_list() {
        let report = executor().execute(&[]).await.unwrap();
        assert!(report.messages.is_empty());
        assert!(report.unregistered.is_empty());
    }

    #[test]
    fn test_capability_for() {
        let executor = executor();
        assert_eq!(
            executor.capability_for("tavily_search_results_json"),
            Some(Capability::WebSearch)
        );
        assert_eq!(executor.capability_for("calculator"), None);
    }

    #[test]
    fn test_policy_wire_format() {
        let policy: UnregisteredPolicy = serde_json::from_str("\"respond\"").unwrap();
        assert_eq!(policy, UnregisteredPolicy::Respond);
    }
}
