//! Append-only TODO document.

use std::path::PathBuf;

use super::MaterializeError;
use crate::plan::TodoPlan;
use crate::ports::filesystem::FileSystem;

/// Title line written when the document is created.
pub const TODO_TITLE: &str = "# TODO\n";

/// Appends categorized task blocks to a Markdown TODO file.
///
/// The document is a log: nothing is parsed back and repeated categories
/// simply produce repeated headings.
pub struct TodoAppender<'a> {
    fs: &'a dyn FileSystem,
    path: PathBuf,
}

impl<'a> TodoAppender<'a> {
    /// Appender for the document at `path`.
    pub fn new(fs: &'a dyn FileSystem, path: impl Into<PathBuf>) -> Self {
        Self { fs, path: path.into() }
    }

    /// Appends one `## category` block with a checkbox per task.
    ///
    /// # Errors
    ///
    /// Returns [`MaterializeError::Io`] when the document cannot be created
    /// or appended to.
    pub fn append(&self, category: &str, tasks: &[String]) -> Result<(), MaterializeError> {
        self.ensure_document()?;
        self.fs
            .append(&self.path, &render_block(category, tasks))
            .map_err(|e| MaterializeError::io(&self.path, &*e))?;
        tracing::debug!(
            path = %self.path.display(),
            category,
            tasks = tasks.len(),
            "todo appended"
        );
        Ok(())
    }

    /// Appends every category of `todo`, in plan order.
    ///
    /// # Errors
    ///
    /// Stops at the first category that cannot be written.
    pub fn append_plan(&self, todo: &TodoPlan) -> Result<(), MaterializeError> {
        for (category, tasks) in todo {
            self.append(category, tasks)?;
        }
        Ok(())
    }

    fn ensure_document(&self) -> Result<(), MaterializeError> {
        if self.fs.exists(&self.path) {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent).map_err(|e| MaterializeError::io(parent, &*e))?;
        }
        self.fs.write(&self.path, TODO_TITLE).map_err(|e| MaterializeError::io(&self.path, &*e))
    }
}

/// Text of one category block, starting with a blank line.
#[must_use]
pub fn render_block(category: &str, tasks: &[String]) -> String {
    let mut block = format!("\n## {category}\n");
    for task in tasks {
        block.push_str("- [ ] ");
        block.push_str(task);
        block.push('\n');
    }
    block
}
