//! OpenAI-compatible chat completions client (Groq by default)

use crate::agent::types::*;
use crate::config::LlmConfig;
use crate::core::{ChatModel, ModelReply};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

/// Chat completions API client
#[derive(Clone)]
pub struct ChatCompletionsClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
}

impl ChatCompletionsClient {
    /// Create a new client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!(
                "Bearer {}",
                config.api_key.expose_secret()
            ))
            .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(ChatCompletionsClient { client, config })
    }

    /// Send a request to the chat completions endpoint
    async fn send_request(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        debug!(
            "Sending chat completion: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let body = response
                .json::<ChatCompletionResponse>()
                .await
                .map_err(|e| Error::Inference(format!("invalid response body: {}", e)))?;

            if let Some(ref usage) = body.usage {
                info!(
                    "Chat completion response: model={}, tokens={}",
                    body.model, usage.total_tokens
                );
            }

            Ok(body)
        } else {
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                warn!("Rate limit exceeded: {}", error_text);
            }
            Err(Error::Inference(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }
}

#[async_trait]
impl ChatModel for ChatCompletionsClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &GenerationOptions,
    ) -> Result<ModelReply> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(to_api_message).collect(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            tools: (!tools.is_empty()).then(|| tools.to_vec()),
            tool_choice: (!tools.is_empty()).then(|| "auto".to_string()),
        };

        let response = self.send_request(request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Inference("response contained no choices".to_string()))?;

        Ok(ModelReply {
            message: from_api_message(choice.message),
            finish_reason: choice.finish_reason,
            usage: response.usage,
        })
    }
}

/// Convert a domain message into its wire form
pub(crate) fn to_api_message(message: &Message) -> ApiMessage {
    let tool_calls = message.has_tool_calls().then(|| {
        message
            .tool_calls
            .iter()
            .map(|call| AssistantToolCall {
                id: call.id.clone(),
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.to_string(),
                },
            })
            .collect()
    });

    // Assistant tool-call turns without text go out as `null` content.
    let content = if message.content.is_empty() && tool_calls.is_some() {
        None
    } else {
        Some(message.content.clone())
    };

    ApiMessage {
        role: message.role,
        content,
        name: message.name.clone(),
        tool_call_id: message.tool_call_id.clone(),
        tool_calls,
    }
}

/// Convert a wire message into a domain message, parsing tool arguments
pub(crate) fn from_api_message(message: ApiMessage) -> Message {
    let tool_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            let arguments = parse_arguments(&tc.function.name, &tc.function.arguments);
            ToolInvocation::new(tc.id, tc.function.name, arguments)
        })
        .collect();

    Message {
        role: message.role,
        content: message.content.unwrap_or_default(),
        name: message.name,
        tool_call_id: message.tool_call_id,
        tool_calls,
    }
}

fn parse_arguments(tool_name: &str, raw: &str) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse tool arguments for {}: {}", tool_name, e);
            serde_json::json!({})
        }
    }
}
