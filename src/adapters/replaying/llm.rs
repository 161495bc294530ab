//! Replaying adapter for the `LlmClient` port.

use std::path::Path;
use std::sync::Mutex;

use super::decode_result;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient, LlmError};

/// Serves recorded LLM completions from a cassette, in order.
pub struct ReplayingLlmClient {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingLlmClient {
    /// Create a replaying LLM client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    /// Loads a cassette file and replays its `llm::complete` interactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        Ok(Self::new(CassetteReplayer::new(&Cassette::load(path)?)))
    }

    /// Builds a client that answers with `replies` in order.
    ///
    /// Convenience for tests and demos that script a conversation directly.
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let interactions = replies
            .into_iter()
            .enumerate()
            .map(|(seq, text)| crate::cassette::format::Interaction {
                seq: seq as u64,
                port: "llm".into(),
                method: "complete".into(),
                input: serde_json::Value::Null,
                output: serde_json::json!({
                    "ok": { "text": text.into(), "prompt_tokens": 0, "completion_tokens": 0 }
                }),
            })
            .collect();
        let cassette =
            Cassette { name: "scripted".into(), recorded_at: chrono::Utc::now(), interactions };
        Self::new(CassetteReplayer::new(&cassette))
    }

    fn next_result(&self) -> Result<CompletionResponse, LlmError> {
        let interaction = self
            .replayer
            .lock()
            .map_err(|e| LlmError::new(format!("replayer lock poisoned: {e}")))?
            .next_interaction("llm", "complete")
            .map_err(LlmError::new)?;
        decode_result::<CompletionResponse, LlmError>(&interaction.output).map_err(LlmError::new)?
    }
}

impl LlmClient for ReplayingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> CompletionFuture<'_> {
        let result = self.next_result();
        Box::pin(async move { result })
    }
}
