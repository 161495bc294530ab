//! Unified line diff between existing and proposed file content.

use colored::Colorize;
use similar::TextDiff;

const CONTEXT_LINES: usize = 3;

/// Whether two contents differ once surrounding whitespace is ignored.
///
/// Internal whitespace is significant; only a leading/trailing difference
/// (typically a final newline) counts as "no change".
#[must_use]
pub fn differs(old: &str, new: &str) -> bool {
    old.trim() != new.trim()
}

/// Renders a unified diff of `old` against `new` for the file `label`.
///
/// Returns no lines when the contents only differ in surrounding whitespace.
#[must_use]
pub fn render(old: &str, new: &str, label: &str) -> Vec<String> {
    if !differs(old, new) {
        return Vec::new();
    }

    let diff = TextDiff::from_lines(old, new);
    let (a, b) = (format!("a/{label}"), format!("b/{label}"));
    let mut unified = diff.unified_diff();
    unified.context_radius(CONTEXT_LINES).header(&a, &b);
    unified.to_string().lines().map(String::from).collect()
}

/// Colours one rendered diff line for terminal display.
#[must_use]
pub fn paint(line: &str) -> String {
    if line.starts_with("+++") || line.starts_with("---") {
        line.bold().to_string()
    } else if line.starts_with("@@") {
        line.cyan().to_string()
    } else if line.starts_with('+') {
        line.green().to_string()
    } else if line.starts_with('-') {
        line.red().to_string()
    } else {
        line.to_string()
    }
}
