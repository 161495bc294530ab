//! The persisted conversation log (`session.json`).

use std::path::{Path, PathBuf};

use super::StateError;
use crate::ports::filesystem::FileSystem;
use crate::ports::llm::Message;

/// File name of the log inside the state directory.
pub const SESSION_FILE: &str = "session.json";

/// JSON array of [`Message`]s, rewritten whole on every change.
///
/// There is no locking: two concurrent runs against the same project can
/// lose each other's messages.
pub struct SessionLog<'a> {
    fs: &'a dyn FileSystem,
    path: PathBuf,
}

impl<'a> SessionLog<'a> {
    /// Log stored in `state_dir`.
    pub fn new(fs: &'a dyn FileSystem, state_dir: &Path) -> Self {
        Self { fs, path: state_dir.join(SESSION_FILE) }
    }

    /// Location of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole log, creating an empty one on first use.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not a JSON array
    /// of messages.
    pub fn load(&self) -> Result<Vec<Message>, StateError> {
        if !self.fs.exists(&self.path) {
            self.save(&[])?;
            return Ok(Vec::new());
        }
        let raw = self.fs.read_to_string(&self.path).map_err(|e| StateError::io(&self.path, &*e))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| StateError::corrupt(&self.path, &e))
    }

    /// Replaces the log with `messages`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save(&self, messages: &[Message]) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(messages)
            .map_err(|e| StateError::corrupt(&self.path, &e))?;
        self.fs.write(&self.path, &json).map_err(|e| StateError::io(&self.path, &*e))
    }

    /// Loads, pushes `message`, and saves.
    ///
    /// # Errors
    ///
    /// Propagates [`load`](Self::load) and [`save`](Self::save) failures.
    pub fn append(&self, message: Message) -> Result<(), StateError> {
        let mut messages = self.load()?;
        messages.push(message);
        self.save(&messages)
    }

    /// Empties the log.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn clear(&self) -> Result<(), StateError> {
        self.save(&[])
    }
}
