//! `forgeplan tests` command.

use std::path::{Path, PathBuf};

use colored::Colorize;

use super::Workspace;
use crate::cli::TestMode;
use crate::context::ServiceContext;
use crate::engine::{Materializer, Mode};
use crate::prompts;

/// Parameters of one `tests` run.
#[derive(Debug, Clone)]
pub struct TestsRequest {
    /// Source file, relative to the project root or absolute.
    pub file: PathBuf,
    /// First line, 1-based; defaults to the first line.
    pub start: Option<usize>,
    /// Last line, 1-based and inclusive; defaults to the last line.
    pub end: Option<usize>,
    /// Kind of tests to generate.
    pub mode: TestMode,
}

/// Lines `start..=end` (1-based, clamped to the file) joined with `\n`.
///
/// # Errors
///
/// Returns an error when the clamped range is empty.
pub fn excerpt(source: &str, start: Option<usize>, end: Option<usize>) -> Result<String, String> {
    let lines: Vec<&str> = source.lines().collect();
    let first = start.unwrap_or(1).max(1);
    let last = end.unwrap_or(lines.len()).min(lines.len());
    if first > last {
        return Err(format!(
            "line range {first}..{last} selects nothing (file has {} lines)",
            lines.len()
        ));
    }
    Ok(lines[first - 1..last].join("\n"))
}

/// `tests/test_<stem>.<ext>` under `root` for `source`.
#[must_use]
pub fn test_path(root: &Path, source: &Path) -> PathBuf {
    let stem = source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match source.extension() {
        Some(ext) => format!("test_{stem}.{}", ext.to_string_lossy()),
        None => format!("test_{stem}"),
    };
    root.join("tests").join(name)
}

fn language(source: &Path) -> String {
    let ext =
        source.extension().map(|e| e.to_string_lossy().to_ascii_lowercase()).unwrap_or_default();
    let name = match ext.as_str() {
        "py" => "Python",
        "rs" => "Rust",
        "js" | "mjs" | "cjs" | "jsx" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "go" => "Go",
        "java" => "Java",
        "rb" => "Ruby",
        "c" | "h" => "C",
        "cc" | "cpp" | "hpp" => "C++",
        "cs" => "C#",
        "" => "source",
        other => other,
    };
    name.to_string()
}

/// Execute the `tests` command.
///
/// # Errors
///
/// Returns an error string when the source file is missing, the range is
/// empty, the model fails, or the test file cannot be written.
pub async fn run(
    ws: &Workspace,
    ctx: &ServiceContext,
    request: &TestsRequest,
) -> Result<(), String> {
    let source_path = ws.root.join(&request.file);
    if !ctx.fs.exists(&source_path) {
        return Err(format!("File {} does not exist.", source_path.display()));
    }
    let source = ctx
        .fs
        .read_to_string(&source_path)
        .map_err(|e| format!("failed to read {}: {e}", source_path.display()))?;
    let code = excerpt(&source, request.start, request.end)?;

    let prompt = prompts::tests(request.mode.as_str(), &language(&source_path), &code);
    let reply = ws.assistant(ctx).send_text(&prompt).await.map_err(|e| e.to_string())?;

    let target = test_path(&ws.root, &request.file);
    if ctx.fs.exists(&target) {
        ctx.fs
            .append(&target, &format!("\n{reply}"))
            .map_err(|e| format!("failed to append to {}: {e}", target.display()))?;
        let note = "Test file already exists. Appended to:".yellow().bold();
        println!("{note} {}", target.display());
    } else {
        let materializer =
            Materializer::new(ctx.fs.as_ref(), ws.gate(ctx), &ws.config.comment_styles);
        materializer.materialize(&target, &reply, Mode::Overwrite).map_err(|e| e.to_string())?;
        println!("{} {}", "Test file created:".green().bold(), target.display());
    }
    Ok(())
}
