//! LLM client port for language-model completions.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Boxed future type alias used by [`LlmClient`] to keep the trait dyn-compatible.
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

/// Speaker of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the whole conversation.
    System,
    /// A prompt sent on behalf of the user.
    User,
    /// A reply produced by the model.
    Assistant,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Builds a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    /// Builds an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    /// Builds a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
}

/// A request to generate a completion from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model identifier (e.g. `"claude-sonnet-4-20250514"`).
    pub model: String,
    /// The full conversation sent to the model, oldest first.
    pub messages: Vec<Message>,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// The response from an LLM completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text.
    pub text: String,
    /// Number of prompt tokens consumed.
    pub prompt_tokens: u32,
    /// Number of completion tokens generated.
    pub completion_tokens: u32,
}

/// Failure of a completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmError {
    /// HTTP status, when the backend answered at all.
    pub status: Option<u16>,
    /// Human-readable description.
    pub message: String,
}

impl LlmError {
    /// Error without an HTTP status (configuration, transport, parsing).
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }

    /// Error returned by the backend with an HTTP status.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self { status: Some(status), message: message.into() }
    }

    /// Whether repeating the same request may succeed.
    ///
    /// Rate limits and server-side failures are transient; other statuses are
    /// not. Errors without a status are transport failures and are retried,
    /// except for missing configuration which cannot fix itself.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.status {
            Some(status) => status == 429 || status >= 500,
            None => !self.message.contains("not set"),
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "LLM backend error ({status}): {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for LlmError {}

/// Sends completion requests to a language model.
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (network, auth, rate-limit, etc.).
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_and_server_errors_are_retryable() {
        assert!(LlmError::with_status(429, "slow down").is_retryable());
        assert!(LlmError::with_status(503, "overloaded").is_retryable());
        assert!(!LlmError::with_status(400, "bad request").is_retryable());
        assert!(!LlmError::with_status(401, "bad key").is_retryable());
    }

    #[test]
    fn transport_errors_retry_but_missing_config_does_not() {
        assert!(LlmError::new("connection reset").is_retryable());
        assert!(!LlmError::new("ANTHROPIC_API_KEY environment variable not set").is_retryable());
    }

    #[test]
    fn message_serializes_lowercase_role() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
