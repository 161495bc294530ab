//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::llm::LiveLlmClient;
use crate::adapters::recording::llm::RecordingLlmClient;
use crate::adapters::replaying::ReplayingLlmClient;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::confirm::Confirmer;
use crate::ports::filesystem::FileSystem;
use crate::ports::llm::LlmClient;

/// Records the run's LLM traffic to the named cassette file.
pub const ENV_RECORD: &str = "FORGEPLAN_RECORD";
/// Serves LLM replies from the named cassette file instead of the network.
pub const ENV_REPLAY: &str = "FORGEPLAN_REPLAY";

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, replaying, recording).
pub struct ServiceContext {
    /// Filesystem for file I/O.
    pub fs: Box<dyn FileSystem>,
    /// LLM client for language-model completions.
    pub llm: Box<dyn LlmClient>,
    /// Answers overwrite and plan confirmations.
    pub confirm: Box<dyn Confirmer>,
    /// Optional cassette recorder; written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Context from explicit adapters.
    #[must_use]
    pub fn new(
        fs: Box<dyn FileSystem>,
        llm: Box<dyn LlmClient>,
        confirm: Box<dyn Confirmer>,
    ) -> Self {
        Self { fs, llm, confirm, recorder: None }
    }

    /// Live disk and network.
    #[must_use]
    pub fn live(confirm: Box<dyn Confirmer>) -> Self {
        Self::new(Box::new(LiveFileSystem), Box::new(LiveLlmClient::new()), confirm)
    }

    /// Live adapters with every LLM exchange captured to `path` on drop.
    ///
    /// Developer-only: this is how cassettes for tests and demos are made.
    #[must_use]
    pub fn recording(path: &Path, confirm: Box<dyn Confirmer>) -> Self {
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, "forgeplan-session")));
        let llm = RecordingLlmClient::new(Box::new(LiveLlmClient::new()), Arc::clone(&recorder));
        Self {
            fs: Box::new(LiveFileSystem),
            llm: Box::new(llm),
            confirm,
            recorder: Some(recorder),
        }
    }

    /// Live disk with LLM replies served from the cassette at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path, confirm: Box<dyn Confirmer>) -> Result<Self, String> {
        let llm = ReplayingLlmClient::from_file(path)?;
        Ok(Self::new(Box::new(LiveFileSystem), Box::new(llm), confirm))
    }

    /// Picks replaying, recording or live adapters from the environment.
    ///
    /// `FORGEPLAN_REPLAY` wins over `FORGEPLAN_RECORD` when both are set.
    ///
    /// # Errors
    ///
    /// Returns an error if a replay cassette cannot be loaded.
    pub fn from_env<E>(env: E, confirm: Box<dyn Confirmer>) -> Result<Self, String>
    where
        E: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        if let Some(path) = set(ENV_REPLAY) {
            tracing::debug!(cassette = %path, "replaying LLM traffic");
            return Self::replaying(Path::new(&path), confirm);
        }
        if let Some(path) = set(ENV_RECORD) {
            tracing::debug!(cassette = %path, "recording LLM traffic");
            return Ok(Self::recording(Path::new(&path), confirm));
        }
        Ok(Self::live(confirm))
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else {
            return;
        };
        // The recording client still holds a handle; release it first.
        self.llm = Box::new(ReplayingLlmClient::scripted(Vec::<String>::new()));
        match Arc::try_unwrap(recorder).map(Mutex::into_inner) {
            Ok(Ok(recorder)) => match recorder.finish() {
                Ok(path) => tracing::info!(path = %path.display(), "cassette written"),
                Err(e) => tracing::warn!("failed to write cassette: {e}"),
            },
            Ok(Err(e)) => tracing::warn!("cassette recorder lock poisoned: {e}"),
            Err(_) => tracing::warn!("cassette recorder still shared; not written"),
        }
    }
}
