//! Live adapter for the `LlmClient` port using the Anthropic messages API.

use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::llm::{
    CompletionFuture, CompletionRequest, CompletionResponse, LlmClient, LlmError, Role,
};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Live LLM client that calls the Anthropic Claude API.
pub struct LiveLlmClient {
    client: Client,
    url: String,
}

impl LiveLlmClient {
    /// Creates a new live LLM client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_url(ANTHROPIC_API_URL)
    }

    /// Creates a client posting to a different messages endpoint (proxies, gateways).
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { client: Client::new(), url: url.into() }
    }
}

impl Default for LiveLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Request body sent to the Anthropic messages API.
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage<'a>>,
}

/// A single message in the Anthropic API request.
#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Top-level response from the Anthropic messages API.
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

/// A content block in the Anthropic response.
#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Token usage reported by the Anthropic API.
#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Error response from the Anthropic API.
#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

/// Detail inside an Anthropic error response.
#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Splits system messages out of the conversation; the API takes them as a
/// separate top-level field.
fn build_body(request: &CompletionRequest) -> AnthropicRequest<'_> {
    let system: Vec<&str> = request
        .messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let messages = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| AnthropicMessage { role: m.role.as_str(), content: &m.content })
        .collect();

    AnthropicRequest {
        model: &request.model,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        system: if system.is_empty() { None } else { Some(system.join("\n\n")) },
        messages,
    }
}

impl LlmClient for LiveLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let api_key = env::var("ANTHROPIC_API_KEY")
                .map_err(|_| LlmError::new("ANTHROPIC_API_KEY environment variable not set"))?;

            let body = build_body(&request);
            tracing::debug!(
                model = %request.model,
                messages = body.messages.len(),
                "sending completion request"
            );

            let response = self
                .client
                .post(&self.url)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await
                .map_err(|e| LlmError::new(format!("Anthropic API request failed: {e}")))?;

            let status = response.status();
            let response_text = response
                .text()
                .await
                .map_err(|e| LlmError::new(format!("Failed to read Anthropic API response: {e}")))?;

            if !status.is_success() {
                let msg = serde_json::from_str::<AnthropicError>(&response_text)
                    .map(|e| e.error.message)
                    .unwrap_or(response_text);
                return Err(LlmError::with_status(status.as_u16(), msg));
            }

            let api_response: AnthropicResponse = serde_json::from_str(&response_text)
                .map_err(|e| {
                    LlmError::new(format!("Failed to parse Anthropic API response: {e}"))
                })?;

            let text = api_response.content.into_iter().map(|block| block.text).collect::<String>();

            Ok(CompletionResponse {
                text,
                prompt_tokens: api_response.usage.input_tokens,
                completion_tokens: api_response.usage.output_tokens,
            })
        })
    }
}
