//! `forgeplan scaffold` command.

use colored::Colorize;

use super::{apply_plan, ensure_clean, require, Workspace};
use crate::context::ServiceContext;
use crate::plan::ProjectPlan;
use crate::prompts;

/// Execute the `scaffold` command.
///
/// Existing files only receive a documentation header; missing files are
/// created.
///
/// # Errors
///
/// Returns an error string when the user declines, the plan is unusable, or
/// any entry could not be materialized.
pub async fn run(
    ws: &Workspace,
    ctx: &ServiceContext,
    context: Option<&str>,
) -> Result<(), String> {
    let memory = ws.memory(ctx)?;
    let facts = memory_summary(&memory)?;
    let context = context.unwrap_or("Use the known project facts.");

    let reply = ws
        .assistant(ctx)
        .send(&prompts::scaffold(context, &facts))
        .await
        .map_err(|e| e.to_string())?;
    let plan = ProjectPlan::from_value(&reply).map_err(|e| e.to_string())?;
    print!("{plan}");
    require(ws.gate(ctx), "Apply this plan?")?;

    let report = apply_plan(ws, ctx, &plan, &ws.root)?;
    ensure_clean(&report)?;
    println!("{}", "Scaffolding complete.".green().bold());
    Ok(())
}

/// Project memory as YAML for prompts; `(none)` when empty.
pub(crate) fn memory_summary(memory: &crate::session::ProjectMemory<'_>) -> Result<String, String> {
    let facts = memory.load_memory().map_err(|e| e.to_string())?;
    if facts.is_empty() {
        return Ok("(none)".to_string());
    }
    serde_yaml::to_string(&facts).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::policy::{AlwaysApprove, FailIfPrompted};
    use crate::commands::test_support::setup;

    const PLAN: &str = r#"{
        "structure": {
            "app.py": "Application entry point.",
            "notes.txt": "Notes.",
            "lib": {"util.py": "x = 1\n"}
        },
        "todo": ["Document modules"]
    }"#;

    const DOCUMENTED_PLAN: &str = r#"{
        "structure": {"app.py": "Application entry point.", "lib": {"util.py": "x = 1\n"}},
        "todo": ["Document modules"]
    }"#;

    #[tokio::test]
    async fn documents_existing_and_creates_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.py"), "import sys\n").unwrap();
        let (ws, ctx) = setup(dir.path(), &[DOCUMENTED_PLAN], AlwaysApprove, false);

        run(&ws, &ctx, Some("a CLI")).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("app.py")).unwrap(),
            "\"\"\"Application entry point.\"\"\"\nimport sys\n"
        );
        assert_eq!(std::fs::read_to_string(dir.path().join("lib/util.py")).unwrap(), "x = 1\n");
        let todo = std::fs::read_to_string(dir.path().join("TODO.md")).unwrap();
        assert!(todo.contains("## General\n- [ ] Document modules\n"));
    }

    #[tokio::test]
    async fn unsupported_existing_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "v1").unwrap();
        let (ws, ctx) = setup(dir.path(), &[PLAN], AlwaysApprove, false);

        let err = run(&ws, &ctx, None).await.unwrap_err();

        assert!(err.contains("1 entry"));
        assert_eq!(std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "v1");
        assert!(dir.path().join("lib/util.py").is_file());
    }

    #[tokio::test]
    async fn non_interactive_run_fails_at_the_plan_question() {
        let dir = tempfile::tempdir().unwrap();
        let (ws, ctx) = setup(dir.path(), &[PLAN], FailIfPrompted, false);

        let err = run(&ws, &ctx, None).await.unwrap_err();

        assert!(err.contains("non-interactive"));
        assert!(!dir.path().join("app.py").exists());
    }
}
