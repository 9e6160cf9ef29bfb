//! Tavily web search tool
//!
//! The single capability the agent can invoke. Requires a Tavily API key.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::registry::Capability;
use super::traits::{Tool, ToolResult};
use crate::config::{SearchDepth, TavilyConfig};
use crate::{Error, Result};

/// Tavily search request body
#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: SearchDepth,
    max_results: u8,
    include_answer: bool,
    include_images: bool,
}

/// Tavily search response
#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

/// A single search hit as presented to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub content: String,
}

/// Tavily search tool
pub struct TavilySearchTool {
    client: Client,
    config: TavilyConfig,
}

impl TavilySearchTool {
    /// Create a new Tavily search tool
    pub fn new(config: TavilyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Perform a search
    async fn search(&self, query: &str, depth: SearchDepth) -> Result<Vec<TavilyResult>> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));

        let request = TavilyRequest {
            api_key: self.config.api_key.expose_secret(),
            query,
            search_depth: depth,
            max_results: self.config.max_results,
            include_answer: false,
            include_images: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ToolExecution(format!("Tavily request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ToolExecution(format!(
                "Tavily search failed with status {}: {}",
                status, text
            )));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| Error::ToolExecution(format!("Failed to parse Tavily response: {}", e)))?;

        Ok(body.results)
    }
}

#[async_trait]
impl Tool for TavilySearchTool {
    fn name(&self) -> &str {
        Capability::WebSearch.name()
    }

    fn description(&self) -> &str {
        "A search engine optimized for comprehensive, accurate, and trusted results. \
         Useful for when you need to answer questions about current events. \
         Input should be a search query."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "search query to look up"
                },
                "search_depth": {
                    "type": "string",
                    "enum": ["basic", "advanced"],
                    "description": "How thorough the search should be (default: basic)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::ToolExecution("Missing 'query' parameter".to_string()))?;

        let depth = args
            .get("search_depth")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.config.search_depth);

        info!("Tavily search: query='{}', depth={}", query, depth);

        let hits = self.search(query, depth).await?;
        debug!("Tavily returned {} results", hits.len());

        let urls: Vec<&str> = hits.iter().map(|r| r.url.as_str()).collect();
        let titles: Vec<&str> = hits.iter().map(|r| r.title.as_str()).collect();
        let metadata = serde_json::json!({
            "query": query,
            "urls": urls,
            "titles": titles,
        });

        let results: Vec<SearchResult> = hits
            .into_iter()
            .map(|r| SearchResult {
                url: r.url,
                content: r.content,
            })
            .collect();

        Ok(ToolResult::success_with_metadata(
            serde_json::to_string(&results)?,
            metadata,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> TavilyConfig {
        TavilyConfig {
            api_key: SecretString::from("tvly-test"),
            base_url: base_url.to_string(),
            search_depth: SearchDepth::Basic,
            max_results: 5,
            timeout_secs: 10,
        }
    }

    #[tokio::test]
    async fn test_search_formats_results_for_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(serde_json::json!({
                "api_key": "tvly-test",
                "query": "weather in ap",
                "search_depth": "basic",
                "max_results": 5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": "weather in ap",
                "results": [
                    {"title": "AP Weather", "url": "https://weather.example/ap", "content": "Sunny, 31C", "score": 0.9},
                    {"title": "Forecast", "url": "https://forecast.example/ap", "content": "Rain later", "score": 0.7}
                ]
            })))
            .mount(&server)
            .await;

        let tool = TavilySearchTool::new(test_config(&server.uri())).unwrap();
        let result = tool
            .execute(serde_json::json!({"query": "weather in ap"}))
            .await
            .unwrap();

        let parsed: Vec<SearchResult> = serde_json::from_str(&result.content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].content, "Sunny, 31C");
        assert_eq!(
            result.urls(),
            vec!["https://weather.example/ap", "https://forecast.example/ap"]
        );
    }

    #[tokio::test]
    async fn test_search_depth_argument_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(serde_json::json!({"search_depth": "advanced"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tool = TavilySearchTool::new(test_config(&server.uri())).unwrap();
        let result = tool
            .execute(serde_json::json!({"query": "rust", "search_depth": "advanced"}))
            .await
            .unwrap();
        assert_eq!(result.content, "[]");
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let tool = TavilySearchTool::new(test_config(&server.uri())).unwrap();
        let err = tool
            .execute(serde_json::json!({"query": "anything"}))
            .await
            .unwrap_err();
        assert!(err.is_tool_failure());
    }

    #[tokio::test]
    async fn test_missing_query_is_rejected() {
        let tool = TavilySearchTool::new(test_config("http://127.0.0.1:9")).unwrap();
        let result = tool.execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(Error::ToolExecution(_))));
    }

    #[test]
    fn test_definition_uses_capability_name() {
        let tool = TavilySearchTool::new(test_config("https://api.tavily.com")).unwrap();
        let def = tool.to_definition();
        assert_eq!(def.function.name, "tavily_search_results_json");
        assert_eq!(def.function.parameters["required"][0], "query");
    }
}
