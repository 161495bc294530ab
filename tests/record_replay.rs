//! Record-replay round trip through the conversation layer.
//!
//! 1. Drive an `Assistant` through a `RecordingLlmClient` and write the cassette.
//! 2. Replay the cassette from disk with `ReplayingLlmClient::from_file`.
//! 3. Assert the replayed answers match the recorded ones, twice.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use forgeplan::adapters::live::filesystem::LiveFileSystem;
use forgeplan::adapters::recording::llm::RecordingLlmClient;
use forgeplan::adapters::replaying::ReplayingLlmClient;
use forgeplan::cassette::format::Cassette;
use forgeplan::cassette::recorder::CassetteRecorder;
use forgeplan::ports::LlmClient;
use forgeplan::session::{Assistant, AssistantSettings, SessionLog};

fn settings() -> AssistantSettings {
    AssistantSettings {
        retry_backoff: Duration::ZERO,
        max_retries: 0,
        ..AssistantSettings::default()
    }
}

async fn converse(llm: &dyn LlmClient, state_dir: &Path) -> (Value, String) {
    let fs = LiveFileSystem;
    let assistant = Assistant::new(llm, SessionLog::new(&fs, state_dir), settings());
    let proposal = assistant.send("Name this project").await.unwrap();
    let note = assistant.send_text("Summarize it").await.unwrap();
    (proposal, note)
}

#[tokio::test]
async fn record_then_replay_produces_identical_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let cassette_path = dir.path().join("roundtrip.cassette.yaml");

    let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&cassette_path, "roundtrip")));
    let inner =
        ReplayingLlmClient::scripted([r#"{"name": "Tally", "stack": "Rust"}"#, "A counter."]);
    let recording = RecordingLlmClient::new(Box::new(inner), Arc::clone(&recorder));
    let recorded = converse(&recording, &dir.path().join("record")).await;
    drop(recording);

    let recorder = Arc::try_unwrap(recorder).ok().unwrap().into_inner().unwrap();
    assert_eq!(recorder.finish().unwrap(), cassette_path);

    let cassette = Cassette::load(&cassette_path).unwrap();
    assert_eq!(cassette.interactions.len(), 2);
    assert!(cassette.interactions.iter().all(|i| i.port == "llm" && i.method == "complete"));
    assert_eq!(recorded.0, json!({"name": "Tally", "stack": "Rust"}));
    assert_eq!(recorded.1, "A counter.");

    let first = ReplayingLlmClient::from_file(&cassette_path).unwrap();
    assert_eq!(converse(&first, &dir.path().join("replay1")).await, recorded);

    let second = ReplayingLlmClient::from_file(&cassette_path).unwrap();
    assert_eq!(converse(&second, &dir.path().join("replay2")).await, recorded);
}

#[tokio::test]
async fn replay_past_the_end_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let llm = ReplayingLlmClient::scripted(["only"]);
    let fs = LiveFileSystem;
    let assistant = Assistant::new(&llm, SessionLog::new(&fs, dir.path()), settings());

    assert_eq!(assistant.send_text("one").await.unwrap(), "only");
    assert!(assistant.send_text("two").await.is_err());
}
