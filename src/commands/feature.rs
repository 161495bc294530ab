//! `forgeplan feature` command.

use colored::Colorize;

use super::scaffold::memory_summary;
use super::{apply_plan, ensure_clean, Workspace};
use crate::context::ServiceContext;
use crate::plan::ProjectPlan;
use crate::prompts;

/// Execute the `feature` command.
///
/// # Errors
///
/// Returns an error string when the plan is unusable or any entry could not
/// be materialized.
pub async fn run(ws: &Workspace, ctx: &ServiceContext, description: &str) -> Result<(), String> {
    println!("{} {description}", "Adding feature:".green().bold());
    let memory = ws.memory(ctx)?;
    let facts = memory_summary(&memory)?;

    let reply = ws
        .assistant(ctx)
        .send(&prompts::feature(description, &facts))
        .await
        .map_err(|e| e.to_string())?;
    let plan = ProjectPlan::from_value(&reply).map_err(|e| e.to_string())?;

    let report = apply_plan(ws, ctx, &plan, &ws.root)?;
    ensure_clean(&report)?;
    println!("{}", "Feature added successfully!".green().bold());
    Ok(())
}
