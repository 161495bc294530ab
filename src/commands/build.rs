//! `forgeplan build` command.

use colored::Colorize;

use super::{apply_plan, ask_line, ensure_clean, require, Workspace};
use crate::context::ServiceContext;
use crate::engine::{Materializer, Mode, Outcome};
use crate::plan::{ProjectPlan, Proposal};
use crate::prompts;

/// README written at the root of a new project.
#[must_use]
pub fn readme(name: &str, idea: &str, stack: &str) -> String {
    format!("# {name}\n\n## Project Overview\n\n**Idea:** {idea}\n\n## Tech Stack\n\n{stack}\n\n")
}

/// Execute the `build` command.
///
/// # Errors
///
/// Returns an error string when the user declines, the model's answers are
/// unusable, or any file of the new project could not be written.
pub async fn run(ws: &Workspace, ctx: &ServiceContext, idea: Option<&str>) -> Result<(), String> {
    let idea = match idea {
        Some(idea) if !idea.trim().is_empty() => idea.trim().to_string(),
        _ => ask_line("What do you want to build?")?,
    };
    let assistant = ws.assistant(ctx);

    let reply = assistant.send(&prompts::name_and_stack(&idea)).await.map_err(|e| e.to_string())?;
    let proposal = Proposal::from_value(&reply).map_err(|e| e.to_string())?;
    let stack = proposal.stack_text();
    println!("{} {}", "Project name:".bold(), proposal.name);
    println!("{}\n{stack}", "Tech stack:".bold());
    require(ws.gate(ctx), "Proceed with this name and stack?")?;

    let reply = assistant
        .send(&prompts::plan(&idea, &proposal.name, &stack))
        .await
        .map_err(|e| e.to_string())?;
    let plan = ProjectPlan::from_value(&reply).map_err(|e| e.to_string())?;
    print!("{plan}");
    require(ws.gate(ctx), "Create this project?")?;

    let project_root = ws.root.join(proposal.slug());
    tracing::info!(root = %project_root.display(), "building project");
    let report = apply_plan(ws, ctx, &plan, &project_root)?;

    let materializer = Materializer::new(ctx.fs.as_ref(), ws.gate(ctx), &ws.config.comment_styles);
    let readme_path = project_root.join("README.md");
    let outcome = materializer
        .materialize(&readme_path, &readme(&proposal.name, &idea, &stack), Mode::Overwrite)
        .map_err(|e| e.to_string())?;
    if outcome == Outcome::Aborted {
        println!("{}", "README.md left unchanged.".yellow());
    }

    let memory = ws.memory_at(ctx, &project_root)?;
    memory.update_memory("name", &proposal.name).map_err(|e| e.to_string())?;
    memory.update_memory("idea", &idea).map_err(|e| e.to_string())?;
    memory.update_memory("stack", &proposal.stack).map_err(|e| e.to_string())?;

    ensure_clean(&report)?;
    println!("{}", "Project initialized successfully!".green().bold());
    Ok(())
}
