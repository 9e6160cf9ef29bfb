//! searchgraph streaming server
//!
//! `GET /chat_stream/{message}?checkpoint_id=` runs one agent turn and streams
//! its progress as Server-Sent Events. Each event's `data` is a JSON object
//! with a `type` field:
//!
//! - `checkpoint` (new conversations only): the id to send back next time
//! - `search_start` / `search_results` / `search_error`: web search activity
//! - `content`: the answer text
//! - `error`: any other failure
//! - `end`: always last

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Sse,
    },
    routing::get,
    Json, Router,
};
use clap::Parser;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use searchgraph::agent::{
    run_with_callback, ChatCompletionsClient, ExecutedCall, LoopCallback, Message, RunContext,
    ToolInvocation, UnregisteredCall,
};
use searchgraph::config::{validate_config, Config, LogConfig, LogFormat};
use searchgraph::core::InMemoryCheckpointStore;
use searchgraph::tools::{TavilySearchTool, ToolRegistry};

#[derive(Parser)]
#[command(name = "searchgraph-server", about = "searchgraph streaming server")]
struct Args {
    /// Bind address (defaults to server.host)
    #[arg(long)]
    bind: Option<String>,

    /// Port (defaults to server.port)
    #[arg(long, short)]
    port: Option<u16>,
}

// ---- Events ----

/// One SSE payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    Checkpoint { checkpoint_id: String },
    Content { content: String },
    SearchStart { query: String },
    SearchResults { urls: Vec<String> },
    SearchError { error: String },
    Error { error: String },
    End,
}

impl StreamEvent {
    fn into_sse(self) -> Event {
        Event::default().data(serde_json::to_string(&self).unwrap_or_default())
    }
}

/// Forwards loop events to the client
struct SseProgress {
    tx: mpsc::Sender<StreamEvent>,
}

impl SseProgress {
    async fn send(&self, event: StreamEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("SSE client disconnected");
        }
    }
}

#[async_trait]
impl LoopCallback for SseProgress {
    async fn on_tool_invocation(&self, invocation: &ToolInvocation) {
        self.send(StreamEvent::SearchStart {
            query: invocation.query().unwrap_or_default().to_string(),
        })
        .await;
    }

    async fn on_tool_result(&self, call: &ExecutedCall) {
        self.send(StreamEvent::SearchResults {
            urls: call.result.urls(),
        })
        .await;
    }

    async fn on_unregistered(&self, call: &UnregisteredCall) {
        warn!("Unanswered tool request {} ({})", call.name, call.id);
    }
}

// ---- App State ----

#[derive(Clone)]
struct AppState {
    ctx: RunContext,
    sessions: Arc<InMemoryCheckpointStore>,
}

#[derive(Debug, Deserialize)]
struct StreamParams {
    checkpoint_id: Option<String>,
}

// ---- Handlers ----

async fn chat_stream(
    Path(message): Path<String>,
    Query(params): Query<StreamParams>,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(64);

    let (checkpoint_id, is_new) = match params.checkpoint_id.filter(|id| !id.is_empty()) {
        Some(id) => (id, false),
        None => (uuid::Uuid::new_v4().to_string(), true),
    };

    tokio::spawn(async move {
        let progress = SseProgress { tx };
        if is_new {
            progress
                .send(StreamEvent::Checkpoint {
                    checkpoint_id: checkpoint_id.clone(),
                })
                .await;
        }

        let lock = state.sessions.session_lock(&checkpoint_id).await;
        let _guard = lock.lock().await;

        match run_with_callback(&state.ctx, &checkpoint_id, vec![Message::user(message)], &progress).await {
            Ok(output) => {
                progress
                    .send(StreamEvent::Content {
                        content: output.answer().unwrap_or_default().to_string(),
                    })
                    .await;
            }
            Err(e) if e.is_tool_failure() => {
                error!("Search failed for session {}: {}", checkpoint_id, e);
                progress
                    .send(StreamEvent::SearchError {
                        error: e.to_string(),
                    })
                    .await;
            }
            Err(e) => {
                error!("Run failed for session {}: {}", checkpoint_id, e);
                progress
                    .send(StreamEvent::Error {
                        error: e.to_string(),
                    })
                    .await;
            }
        }

        progress.send(StreamEvent::End).await;
    });

    let stream = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(event.into_sse()));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}

/// Health check
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "searchgraph-server",
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/chat_stream/{message}", get(chat_stream))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;

    init_tracing(&config.log);

    let validation = validate_config(&config);
    for warning in &validation.warnings {
        warn!("Config: {}", warning);
    }
    if !validation.valid {
        for issue in &validation.errors {
            error!("Config: {}", issue);
        }
        anyhow::bail!("Configuration is incomplete");
    }

    let model = ChatCompletionsClient::new(config.llm.clone())?;
    let tools = ToolRegistry::new().with(TavilySearchTool::new(config.search.clone())?)?;
    let sessions = Arc::new(InMemoryCheckpointStore::new());

    let state = AppState {
        ctx: RunContext::from_config(
            &config.agent,
            Arc::new(model),
            Arc::new(tools),
            sessions.clone(),
        ),
        sessions,
    };

    let app = build_router(state);

    let host = args.bind.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("searchgraph-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use searchgraph::agent::{GenerationOptions, Role, ToolDefinition};
    use searchgraph::core::{ChatModel, CheckpointStore, ModelReply};
    use searchgraph::tools::{Tool, ToolResult};
    use serde_json::{json, Value};

    const SEARCH: &str = "tavily_search_results_json";

    /// Searches for weather questions, answers everything else directly
    #[derive(Default)]
    struct WeatherModel {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for WeatherModel {
        fn model_name(&self) -> &str {
            "weather"
        }

        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[ToolDefinition],
            _options: &GenerationOptions,
        ) -> searchgraph::Result<ModelReply> {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let last = messages.last().expect("conversation is never empty");
            let message = match last.role {
                Role::User if last.content.contains("weather") => {
                    let query = if last.content.contains("outage") {
                        "outage"
                    } else {
                        "weather in ap"
                    };
                    Message::assistant_with_tool_calls(
                        "",
                        vec![ToolInvocation::new("call_1", SEARCH, json!({"query": query}))],
                    )
                }
                Role::Tool => Message::assistant("Sunny"),
                _ => Message::assistant("Hello!"),
            };
            Ok(ModelReply::new(message))
        }
    }

    struct FakeSearch;

    #[async_trait]
    impl Tool for FakeSearch {
        fn name(&self) -> &str {
            SEARCH
        }

        fn description(&self) -> &str {
            "Search the web"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {"query": {"type": "string"}}})
        }

        async fn execute(&self, args: Value) -> searchgraph::Result<ToolResult> {
            if args["query"] == "outage" {
                return Err(searchgraph::Error::ToolExecution(
                    "Tavily API error (502)".into(),
                ));
            }
            Ok(ToolResult::success_with_metadata(
                json!([{"url": "https://u", "content": "sunny"}]).to_string(),
                json!({"urls": ["https://u"]}),
            ))
        }
    }

    /// Serve the router on an ephemeral port
    async fn serve(model: Arc<WeatherModel>) -> (String, Arc<InMemoryCheckpointStore>) {
        let sessions = Arc::new(InMemoryCheckpointStore::new());
        let tools = ToolRegistry::new().with(FakeSearch).unwrap();
        let state = AppState {
            ctx: RunContext::new(model, Arc::new(tools), sessions.clone()),
            sessions: sessions.clone(),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        (format!("http://{}", addr), sessions)
    }

    /// Fetch a stream to completion and decode each `data:` payload
    async fn fetch_events(url: &str) -> Vec<Value> {
        let body = reqwest::get(url).await.unwrap().text().await.unwrap();
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| serde_json::from_str(data.trim()).unwrap())
            .collect()
    }

    fn types(events: &[Value]) -> Vec<&str> {
        events.iter().map(|e| e["type"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_event_wire_format() {
        let cases = vec![
            (
                StreamEvent::Checkpoint {
                    checkpoint_id: "abc".into(),
                },
                json!({"type": "checkpoint", "checkpoint_id": "abc"}),
            ),
            (
                StreamEvent::SearchStart {
                    query: "weather in SF".into(),
                },
                json!({"type": "search_start", "query": "weather in SF"}),
            ),
            (
                StreamEvent::SearchResults {
                    urls: vec!["https://a.example".into()],
                },
                json!({"type": "search_results", "urls": ["https://a.example"]}),
            ),
            (StreamEvent::End, json!({"type": "end"})),
        ];

        for (event, expected) in cases {
            assert_eq!(serde_json::to_value(&event).unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_progress_forwards_search_events() {
        let (tx, mut rx) = mpsc::channel(8);
        let progress = SseProgress { tx };

        let call = ToolInvocation::new(
            "call_1",
            "tavily_search_results_json",
            json!({"query": "rust"}),
        );
        progress.on_tool_invocation(&call).await;

        assert_eq!(
            rx.recv().await,
            Some(StreamEvent::SearchStart {
                query: "rust".into()
            })
        );
    }

    #[tokio::test]
    async fn test_chat_stream_searches_then_answers() {
        let (base, sessions) = serve(Arc::new(WeatherModel::default())).await;

        let events = fetch_events(&format!(
            "{}/chat_stream/What%20is%20the%20weather%20in%20ap%3F",
            base
        ))
        .await;

        assert_eq!(
            types(&events),
            vec!["checkpoint", "search_start", "search_results", "content", "end"]
        );
        assert_eq!(events[1]["query"], "weather in ap");
        assert_eq!(events[2]["urls"], json!(["https://u"]));
        assert_eq!(events[3]["content"], "Sunny");

        let id = events[0]["checkpoint_id"].as_str().unwrap();
        let saved = sessions.load(id).await.unwrap().unwrap();
        assert_eq!(saved.state.len(), 4);
        assert_eq!(saved.state.messages()[0].content, "What is the weather in ap?");
    }

    #[tokio::test]
    async fn test_chat_stream_resumes_given_checkpoint() {
        let (base, sessions) = serve(Arc::new(WeatherModel::default())).await;

        let first = fetch_events(&format!("{}/chat_stream/hi", base)).await;
        assert_eq!(types(&first), vec!["checkpoint", "content", "end"]);
        let id = first[0]["checkpoint_id"].as_str().unwrap().to_string();

        let second = fetch_events(&format!(
            "{}/chat_stream/what%20about%20the%20weather?checkpoint_id={}",
            base, id
        ))
        .await;
        assert_eq!(
            types(&second),
            vec!["search_start", "search_results", "content", "end"]
        );

        let saved = sessions.load(&id).await.unwrap().unwrap();
        assert_eq!(saved.state.len(), 6);
        assert_eq!(saved.state.messages()[1].content, "Hello!");
    }

    #[tokio::test]
    async fn test_chat_stream_reports_search_failure() {
        let (base, sessions) = serve(Arc::new(WeatherModel::default())).await;

        let events = fetch_events(&format!("{}/chat_stream/weather%20outage", base)).await;

        assert_eq!(
            types(&events),
            vec!["checkpoint", "search_start", "search_error", "end"]
        );
        assert!(events[2]["error"].as_str().unwrap().contains("Tavily API error (502)"));
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_chat_stream_serializes_runs_per_checkpoint() {
        let model = Arc::new(WeatherModel::default());
        let (base, sessions) = serve(model.clone()).await;

        let first_url = format!("{}/chat_stream/hi?checkpoint_id=shared", base);
        let second_url = format!("{}/chat_stream/hello?checkpoint_id=shared", base);
        let (first, second) = tokio::join!(fetch_events(&first_url), fetch_events(&second_url));

        assert_eq!(types(&first), vec!["content", "end"]);
        assert_eq!(types(&second), vec!["content", "end"]);
        assert_eq!(model.max_in_flight.load(Ordering::SeqCst), 1);

        // Neither run overwrote the other's turn
        let saved = sessions.load("shared").await.unwrap().unwrap();
        assert_eq!(saved.state.len(), 4);
    }

    #[tokio::test]
    async fn test_health_check() {
        let (base, _) = serve(Arc::new(WeatherModel::default())).await;
        let body: Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "healthy");
    }
}
