//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{CompletionFuture, CompletionRequest, LlmClient};

/// Records LLM interactions while delegating to an inner implementation.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingLlmClient {
    /// Creates a new recording LLM client wrapping the given implementation.
    pub fn new(inner: Box<dyn LlmClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let result = self.inner.complete(&request).await;
            record_result(&self.recorder, "llm", "complete", &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Cassette;
    use crate::ports::{CompletionResponse, LlmError, Message};

    struct Echo;

    impl LlmClient for Echo {
        fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Box::pin(async move {
                if last == "fail" {
                    return Err(LlmError::with_status(500, "boom"));
                }
                Ok(CompletionResponse { text: last, prompt_tokens: 1, completion_tokens: 1 })
            })
        }
    }

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest {
            model: "m".into(),
            messages: vec![Message::user(text)],
            max_tokens: 8,
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn records_successes_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "llm")));

        {
            let client = RecordingLlmClient::new(Box::new(Echo), Arc::clone(&recorder));
            assert_eq!(client.complete(&request("hello")).await.unwrap().text, "hello");
            assert!(client.complete(&request("fail")).await.is_err());
        }

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        recorder.finish().unwrap();

        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].output["ok"]["text"], "hello");
        assert_eq!(cassette.interactions[1].output["err"]["status"], 500);
        assert_eq!(cassette.interactions[0].input["messages"][0]["content"], "hello");
    }
}
