//! File-mutation engine: turns a validated plan into file system state
//! without silently destroying existing work.
//!
//! Leaf-first: [`diff`] and [`gate`] are stateless services,
//! [`comment_style`] is a read-only table, [`materialize`] owns every write
//! of a single file, [`walker`] drives it over a whole tree, and [`todo`]
//! appends task lists to the TODO document.

pub mod comment_style;
pub mod diff;
pub mod gate;
pub mod materialize;
pub mod todo;
pub mod walker;

use std::path::PathBuf;

use thiserror::Error;

pub use comment_style::{CommentStyle, CommentStyleRegistry};
pub use gate::Gate;
pub use materialize::{Materializer, Mode, Outcome};
pub use todo::TodoAppender;
pub use walker::{StructureWalker, WalkReport};

/// Failure to apply one file or directory. Never fatal for siblings.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// Documentation injection needs a comment style the registry lacks.
    #[error("no comment style registered for extension {extension:?}")]
    UnsupportedFileType {
        /// The extension as found on the file (may be empty).
        extension: String,
    },

    /// The documentation text would terminate its own comment block, either
    /// by containing the end token or by ending in part of it.
    #[error(
        "documentation for {} would be closed early by the comment terminator {token:?}",
        path.display()
    )]
    DocContainsTerminator {
        /// Target file.
        path: PathBuf,
        /// The end token of the file's comment style.
        token: String,
    },

    /// A plan entry name would resolve outside its parent directory.
    #[error("entry name {name:?} escapes the project root")]
    PathEscapesRoot {
        /// The offending entry name.
        name: String,
    },

    /// Reading, writing or creating a path failed.
    #[error("{}: {message}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// The confirmer could not produce an answer.
    #[error("confirmation for {} failed: {message}", path.display())]
    Gate {
        /// File awaiting confirmation.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
}

impl MaterializeError {
    pub(crate) fn io(
        path: impl Into<PathBuf>,
        err: &(dyn std::error::Error + Send + Sync),
    ) -> Self {
        Self::Io { path: path.into(), message: err.to_string() }
    }
}
