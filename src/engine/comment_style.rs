//! File extension to block-comment delimiter table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::MaterializeError;

/// Delimiters wrapping an injected documentation block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentStyle {
    /// Token that opens the block; the file must start with it.
    pub start: String,
    /// Token that closes the block; its first occurrence after `start` ends it.
    pub end: String,
}

impl CommentStyle {
    /// Builds a style from its two delimiters.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self { start: start.into(), end: end.into() }
    }
}

const PYTHON: (&str, &str) = ("\"\"\"", "\"\"\"");
const C_BLOCK: (&str, &str) = ("/*", "*/");
const MARKUP: (&str, &str) = ("<!--", "-->");

/// Only languages with a real block comment are listed. Line-comment-only
/// formats (shell, YAML, TOML, ...) and plain text are deliberately absent.
const BUILTIN: &[(&str, (&str, &str))] = &[
    ("py", PYTHON),
    ("rs", C_BLOCK),
    ("js", C_BLOCK),
    ("jsx", C_BLOCK),
    ("mjs", C_BLOCK),
    ("cjs", C_BLOCK),
    ("ts", C_BLOCK),
    ("tsx", C_BLOCK),
    ("java", C_BLOCK),
    ("c", C_BLOCK),
    ("h", C_BLOCK),
    ("cc", C_BLOCK),
    ("cpp", C_BLOCK),
    ("hpp", C_BLOCK),
    ("cs", C_BLOCK),
    ("go", C_BLOCK),
    ("swift", C_BLOCK),
    ("kt", C_BLOCK),
    ("kts", C_BLOCK),
    ("scala", C_BLOCK),
    ("css", C_BLOCK),
    ("scss", C_BLOCK),
    ("less", C_BLOCK),
    ("sql", C_BLOCK),
    ("dart", C_BLOCK),
    ("html", MARKUP),
    ("htm", MARKUP),
    ("xml", MARKUP),
    ("svg", MARKUP),
    ("vue", MARKUP),
    ("md", MARKUP),
    ("markdown", MARKUP),
    ("lua", ("--[[", "]]")),
    ("hs", ("{-", "-}")),
    ("rb", ("=begin\n", "\n=end")),
];

/// Read-only lookup from extension to [`CommentStyle`].
///
/// Built once at startup (built-ins plus configured additions) and only read
/// afterwards.
#[derive(Debug, Clone)]
pub struct CommentStyleRegistry {
    styles: HashMap<String, CommentStyle>,
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

impl CommentStyleRegistry {
    /// Registry holding the built-in table.
    #[must_use]
    pub fn builtin() -> Self {
        let styles = BUILTIN
            .iter()
            .map(|(ext, (start, end))| ((*ext).to_string(), CommentStyle::new(*start, *end)))
            .collect();
        Self { styles }
    }

    /// Adds or replaces entries. Consumes the registry so additions can only
    /// happen while it is being built.
    #[must_use]
    pub fn with_styles<I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (String, CommentStyle)>,
    {
        for (ext, style) in extra {
            self.styles.insert(normalize(&ext), style);
        }
        self
    }

    /// Style for `extension` (case-insensitive, leading dot optional).
    ///
    /// # Errors
    ///
    /// Returns [`MaterializeError::UnsupportedFileType`] when nothing is
    /// registered for the extension.
    pub fn lookup(&self, extension: &str) -> Result<&CommentStyle, MaterializeError> {
        self.styles.get(&normalize(extension)).ok_or_else(|| {
            MaterializeError::UnsupportedFileType { extension: extension.to_string() }
        })
    }
}

impl Default for CommentStyleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
