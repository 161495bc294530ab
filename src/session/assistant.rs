//! One LLM exchange: budget check, call with retry, log, parse.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::history::SessionLog;
use super::{tokens, StateError};
use crate::ports::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Knobs of the exchange, resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSettings {
    /// Model identifier sent with every request.
    pub model: String,
    /// Cap on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Context window the conversation must fit in, in tokens.
    pub context_window: usize,
    /// Extra attempts after a retryable failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further one.
    pub retry_backoff: Duration,
    /// Instructions sent ahead of the logged conversation.
    pub system: Option<String>,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            temperature: 0.7,
            context_window: 128_000,
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
            system: None,
        }
    }
}

/// Failure of an exchange.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The conversation would not fit in the context window.
    #[error(
        "prompt too long: about {estimated} tokens plus {} reserved for the reply exceeds \
         the {window}-token window; run `forgeplan reset` or shorten the input",
        tokens::EXPECTED_RESPONSE
    )]
    ContextTooLarge {
        /// Estimated prompt tokens.
        estimated: usize,
        /// Configured window.
        window: usize,
    },

    /// The backend kept failing or failed permanently.
    #[error("LLM request failed after {attempts} attempt(s): {source}")]
    Llm {
        /// Number of calls made.
        attempts: u32,
        /// Last failure.
        #[source]
        source: LlmError,
    },

    /// The reply was expected to be JSON and was not.
    #[error("LLM reply is not valid JSON: {message}")]
    InvalidResponse {
        /// Parser error text.
        message: String,
        /// The raw reply.
        reply: String,
    },

    /// The session log could not be read or written.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Sends prompts in the context of the persisted conversation.
pub struct Assistant<'a> {
    llm: &'a dyn LlmClient,
    log: SessionLog<'a>,
    settings: AssistantSettings,
}

impl<'a> Assistant<'a> {
    /// Assistant talking to `llm` and keeping history in `log`.
    #[must_use]
    pub fn new(llm: &'a dyn LlmClient, log: SessionLog<'a>, settings: AssistantSettings) -> Self {
        Self { llm, log, settings }
    }

    /// Sends `prompt` and parses the reply as JSON.
    ///
    /// The exchange is logged before parsing, so an unparseable reply is
    /// still part of the history.
    ///
    /// # Errors
    ///
    /// See [`send_text`](Self::send_text); additionally
    /// [`AssistantError::InvalidResponse`] when the reply is not JSON.
    pub async fn send(&self, prompt: &str) -> Result<Value, AssistantError> {
        let reply = self.send_text(prompt).await?;
        parse_json_reply(&reply)
    }

    /// Sends `prompt` and returns the raw reply text.
    ///
    /// # Errors
    ///
    /// Returns an error when the conversation does not fit the context
    /// window (checked before calling the model), when the backend fails
    /// after all retries, or when the session log cannot be read or written.
    pub async fn send_text(&self, prompt: &str) -> Result<String, AssistantError> {
        let mut history = self.log.load()?;
        history.push(Message::user(prompt));

        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(system) = &self.settings.system {
            messages.push(Message::system(system.as_str()));
        }
        messages.extend(history.iter().cloned());

        if !tokens::fits(&messages, self.settings.context_window) {
            return Err(AssistantError::ContextTooLarge {
                estimated: tokens::estimate_messages(&messages),
                window: self.settings.context_window,
            });
        }

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };
        let response = self.complete_with_retry(&request).await?;
        tracing::debug!(
            prompt_tokens = response.prompt_tokens,
            completion_tokens = response.completion_tokens,
            "completion received"
        );

        history.push(Message::assistant(response.text.as_str()));
        self.log.save(&history)?;
        Ok(response.text)
    }

    /// Forgets the conversation.
    ///
    /// # Errors
    ///
    /// Returns an error when the session log cannot be written.
    pub fn reset(&self) -> Result<(), AssistantError> {
        self.log.clear()?;
        Ok(())
    }

    async fn complete_with_retry(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, AssistantError> {
        let mut attempt = 0u32;
        loop {
            match self.llm.complete(request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.settings.max_retries => {
                    let delay = self.settings.retry_backoff.saturating_mul(1 << attempt.min(16));
                    tracing::warn!(
                        attempt = attempt + 1,
                        ?delay,
                        error = %err,
                        "retrying LLM request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => return Err(AssistantError::Llm { attempts: attempt + 1, source }),
            }
        }
    }
}

/// Parses a JSON reply, tolerating a surrounding Markdown code fence.
///
/// # Errors
///
/// Returns [`AssistantError::InvalidResponse`] when no JSON can be read.
pub fn parse_json_reply(reply: &str) -> Result<Value, AssistantError> {
    serde_json::from_str(strip_fence(reply))
        .map_err(|e| AssistantError::InvalidResponse {
            message: e.to_string(),
            reply: reply.to_string(),
        })
}

fn strip_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = body.split_once('\n').map_or("", |(_, rest)| rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;

    use super::*;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::adapters::replaying::llm::ReplayingLlmClient;
    use crate::ports::llm::{CompletionFuture, Role};

    fn quick() -> AssistantSettings {
        AssistantSettings { retry_backoff: Duration::ZERO, ..AssistantSettings::default() }
    }

    fn log(fs: &MemoryFileSystem) -> SessionLog<'_> {
        SessionLog::new(fs, Path::new("/p/.forgeplan"))
    }

    /// Answers from a queue and keeps every request it saw.
    struct QueueClient {
        replies: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl QueueClient {
        fn new(replies: Vec<Result<&str, LlmError>>) -> Self {
            let replies = replies
                .into_iter()
                .map(|r| {
                    r.map(|text| CompletionResponse {
                        text: text.into(),
                        prompt_tokens: 1,
                        completion_tokens: 1,
                    })
                })
                .collect();
            Self { replies: Mutex::new(replies), seen: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl LlmClient for QueueClient {
        fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
            self.seen.lock().unwrap().push(request.clone());
            let next = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::with_status(400, "queue empty")));
            Box::pin(async move { next })
        }
    }

    #[tokio::test]
    async fn send_parses_json_and_logs_exchange() {
        let fs = MemoryFileSystem::new();
        let llm = ReplayingLlmClient::scripted([r#"{"name": "Demo", "stack": "Rust"}"#]);
        let assistant = Assistant::new(&llm, log(&fs), quick());

        let value = assistant.send("name my project").await.unwrap();

        assert_eq!(value["name"], "Demo");
        let history = log(&fs).load().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], Message::user("name my project"));
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn history_is_sent_with_each_prompt() {
        let fs = MemoryFileSystem::new();
        let llm = QueueClient::new(vec![Ok("{}"), Ok("{}")]);
        let settings = AssistantSettings { system: Some("be terse".into()), ..quick() };
        let assistant = Assistant::new(&llm, log(&fs), settings);

        assistant.send("first").await.unwrap();
        assistant.send("second").await.unwrap();

        let seen = llm.seen.lock().unwrap();
        let roles: Vec<Role> = seen[1].messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(seen[1].temperature, 0.7);
        assert_eq!(seen[1].model, DEFAULT_MODEL);
        // The system prompt is not persisted.
        assert_eq!(log(&fs).load().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn oversized_context_fails_before_calling() {
        let fs = MemoryFileSystem::new();
        let llm = QueueClient::new(vec![Ok("{}")]);
        let settings = AssistantSettings { context_window: 2100, ..quick() };
        let assistant = Assistant::new(&llm, log(&fs), settings);

        let err = assistant.send(&"x".repeat(400)).await.unwrap_err();

        assert!(matches!(err, AssistantError::ContextTooLarge { window: 2100, .. }));
        assert_eq!(llm.calls(), 0);
        assert!(log(&fs).load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn retryable_failures_are_retried() {
        let fs = MemoryFileSystem::new();
        let llm = QueueClient::new(vec![
            Err(LlmError::with_status(529, "overloaded")),
            Err(LlmError::new("connection reset")),
            Ok(r#"{"ok": true}"#),
        ]);
        let assistant = Assistant::new(&llm, log(&fs), quick());

        let value = assistant.send("go").await.unwrap();

        assert_eq!(value["ok"], true);
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let fs = MemoryFileSystem::new();
        let llm = QueueClient::new(vec![
            Err(LlmError::with_status(500, "a")),
            Err(LlmError::with_status(500, "b")),
            Err(LlmError::with_status(500, "c")),
            Ok("{}"),
        ]);
        let assistant = Assistant::new(&llm, log(&fs), quick());

        let err = assistant.send("go").await.unwrap_err();

        assert!(matches!(err, AssistantError::Llm { attempts: 3, .. }));
        assert_eq!(llm.calls(), 3);
        assert!(log(&fs).load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let fs = MemoryFileSystem::new();
        let llm = QueueClient::new(vec![Err(LlmError::with_status(401, "bad key")), Ok("{}")]);
        let assistant = Assistant::new(&llm, log(&fs), quick());

        let err = assistant.send("go").await.unwrap_err();

        assert!(matches!(err, AssistantError::Llm { attempts: 1, .. }));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_json_is_still_logged() {
        let fs = MemoryFileSystem::new();
        let llm = ReplayingLlmClient::scripted(["Sure! Here is your plan."]);
        let assistant = Assistant::new(&llm, log(&fs), quick());

        let err = assistant.send("plan").await.unwrap_err();

        assert!(matches!(err, AssistantError::InvalidResponse { .. }));
        assert_eq!(log(&fs).load().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn send_text_returns_raw_reply() {
        let fs = MemoryFileSystem::new();
        let llm = ReplayingLlmClient::scripted(["def test_x():\n    pass\n"]);
        let assistant = Assistant::new(&llm, log(&fs), quick());

        let text = assistant.send_text("tests please").await.unwrap();

        assert_eq!(text, "def test_x():\n    pass\n");
    }

    #[tokio::test]
    async fn reset_clears_history() {
        let fs = MemoryFileSystem::new();
        let llm = ReplayingLlmClient::scripted(["{}"]);
        let assistant = Assistant::new(&llm, log(&fs), quick());
        assistant.send("x").await.unwrap();

        assistant.reset().unwrap();

        assert!(log(&fs).load().unwrap().is_empty());
    }

    #[test]
    fn fenced_json_is_accepted() {
        let value = parse_json_reply("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value["a"], 1);
        let value = parse_json_reply("```\n[1, 2]\n```\n").unwrap();
        assert_eq!(value[1], 2);
        assert!(parse_json_reply("  {\"b\": null}  ").is_ok());
        assert!(parse_json_reply("```json").is_err());
    }
}
