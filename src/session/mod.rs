//! Conversation and project state persisted under `.forgeplan/`.

pub mod assistant;
pub mod history;
pub mod memory;
pub mod tokens;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use assistant::{Assistant, AssistantError, AssistantSettings};
pub use history::SessionLog;
pub use memory::{ProjectMemory, TodoItem};

/// Name of the per-project state directory.
pub const STATE_DIR: &str = ".forgeplan";

/// State directory for the project at `root`.
#[must_use]
pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR)
}

/// Failure to load or store a state file.
#[derive(Debug, Error)]
pub enum StateError {
    /// The file could not be read or written.
    #[error("{}: {message}", path.display())]
    Io {
        /// State file involved.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// The file exists but does not hold what it should.
    #[error("{} is corrupt: {message}", path.display())]
    Corrupt {
        /// State file involved.
        path: PathBuf,
        /// Parser error text.
        message: String,
    },

    /// A task index outside the list. Displayed 1-based, as users count.
    #[error("no task #{}; the list has {len} task(s)", index + 1)]
    NoSuchTask {
        /// Zero-based index requested.
        index: usize,
        /// Current length of the list.
        len: usize,
    },
}

impl StateError {
    pub(crate) fn io(path: &Path, err: &(dyn std::error::Error + Send + Sync)) -> Self {
        Self::Io { path: path.to_path_buf(), message: err.to_string() }
    }

    pub(crate) fn corrupt(path: &Path, err: &dyn std::error::Error) -> Self {
        Self::Corrupt { path: path.to_path_buf(), message: err.to_string() }
    }
}
