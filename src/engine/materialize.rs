//! Applies one proposed `(path, content)` pair under the overwrite policy.

use std::fmt;
use std::path::Path;

use super::comment_style::{CommentStyle, CommentStyleRegistry};
use super::diff;
use super::gate::Gate;
use super::MaterializeError;
use crate::ports::filesystem::FileSystem;

/// How an existing, differing file is updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Replace the whole file with the proposed content.
    Overwrite,
    /// Keep the file body; replace or prepend its leading documentation
    /// comment with the proposed content.
    Document,
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The file did not exist and was written.
    Created,
    /// The file already had the proposed content (ignoring surrounding whitespace).
    Unchanged,
    /// The file was replaced after approval.
    Overwritten,
    /// Approval was refused; the file was left untouched.
    Aborted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Created => "created",
            Outcome::Unchanged => "unchanged",
            Outcome::Overwritten => "overwritten",
            Outcome::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Transient view of one pending write.
struct FileRecord<'p> {
    path: &'p Path,
    old_content: String,
    new_content: String,
}

/// Owns every decision to write a file of the target project.
pub struct Materializer<'a> {
    fs: &'a dyn FileSystem,
    gate: Gate<'a>,
    styles: &'a CommentStyleRegistry,
}

impl<'a> Materializer<'a> {
    /// Creates a materializer writing through `fs` and asking `gate`.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, gate: Gate<'a>, styles: &'a CommentStyleRegistry) -> Self {
        Self { fs, gate, styles }
    }

    /// The filesystem this materializer writes through.
    #[must_use]
    pub fn fs(&self) -> &'a dyn FileSystem {
        self.fs
    }

    /// Applies `content` to `path`.
    ///
    /// A missing file is created verbatim without consulting the gate. An
    /// existing file whose trimmed content already matches is left alone.
    /// Otherwise the update described by `mode` is diffed and gated.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or written, when
    /// `Document` mode meets an extension without a comment style, or when
    /// the gate cannot answer. The file is untouched in every error case
    /// except a failing final write.
    pub fn materialize(
        &self,
        path: &Path,
        content: &str,
        mode: Mode,
    ) -> Result<Outcome, MaterializeError> {
        if !self.fs.exists(path) {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                self.fs.create_dir_all(parent).map_err(|e| MaterializeError::io(parent, &*e))?;
            }
            self.fs.write(path, content).map_err(|e| MaterializeError::io(path, &*e))?;
            tracing::info!(path = %path.display(), "created");
            return Ok(Outcome::Created);
        }

        let old_content =
            self.fs.read_to_string(path).map_err(|e| MaterializeError::io(path, &*e))?;
        if !diff::differs(&old_content, content) {
            tracing::debug!(path = %path.display(), "unchanged");
            return Ok(Outcome::Unchanged);
        }

        let new_content = match mode {
            Mode::Overwrite => content.to_string(),
            Mode::Document => {
                let style = self.styles.lookup(&extension_of(path))?;
                if closes_early(content, &style.end) {
                    return Err(MaterializeError::DocContainsTerminator {
                        path: path.to_path_buf(),
                        token: style.end.clone(),
                    });
                }
                inject_doc(&old_content, content, style)
            }
        };

        self.apply_change(&FileRecord { path, old_content, new_content })
    }

    fn apply_change(&self, record: &FileRecord<'_>) -> Result<Outcome, MaterializeError> {
        let label = record.path.display().to_string();
        let lines = diff::render(&record.old_content, &record.new_content, &label);
        if lines.is_empty() {
            tracing::debug!(path = %label, "unchanged after documentation injection");
            return Ok(Outcome::Unchanged);
        }

        let message = format!("Overwrite {label}?\n{}", lines.join("\n"));
        let approved = self.gate.confirm(&message).map_err(|e| MaterializeError::Gate {
            path: record.path.to_path_buf(),
            message: e.to_string(),
        })?;
        if !approved {
            tracing::info!(path = %label, "overwrite refused");
            return Ok(Outcome::Aborted);
        }

        self.fs
            .write(record.path, &record.new_content)
            .map_err(|e| MaterializeError::io(record.path, &*e))?;
        tracing::info!(path = %label, "overwritten");
        Ok(Outcome::Overwritten)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Whether the first `end` in `doc + end` starts before `end` itself, i.e.
/// the written block would be closed inside `doc`.
///
/// Catches docs containing the token and docs ending in a prefix of it
/// (`Runs "main"` under `"""`).
fn closes_early(doc: &str, end: &str) -> bool {
    format!("{doc}{end}").find(end) != Some(doc.len())
}

/// Byte offset just past the leading comment block, if the file has one.
///
/// After any leading whitespace or byte order mark the file must continue
/// with `style.start`; the first `style.end` after it closes the block. An
/// unterminated opener is not a block.
fn leading_block_end(text: &str, style: &CommentStyle) -> Option<usize> {
    let trimmed = text.trim_start_matches(|c: char| c == '\u{feff}' || c.is_whitespace());
    let skipped = text.len() - trimmed.len();
    let after_start = trimmed.strip_prefix(style.start.as_str())?;
    let offset = after_start.find(style.end.as_str())?;
    Some(skipped + style.start.len() + offset + style.end.len())
}

/// Replaces the leading documentation block of `existing` with `doc`, or
/// prepends one when there is none. Whitespace before a replaced block is
/// dropped so the new block starts the file.
#[must_use]
pub fn inject_doc(existing: &str, doc: &str, style: &CommentStyle) -> String {
    let body = match leading_block_end(existing, style) {
        Some(end) => {
            let rest = &existing[end..];
            rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')).unwrap_or(rest)
        }
        None => existing,
    };
    format!("{}{doc}{}\n{body}", style.start, style.end)
}
