//! `forgeplan todo` command.

use colored::Colorize;

use super::Workspace;
use crate::cli::TodoAction;
use crate::context::ServiceContext;
use crate::session::memory::PENDING;
use crate::session::TodoItem;

/// One listing line, e.g. `2. [x] Ship it`.
#[must_use]
pub fn format_item(position: usize, item: &TodoItem) -> String {
    let mark = if item.is_done() { "x" } else { " " };
    format!("{position}. [{mark}] {}", item.task)
}

/// Execute the `todo` command.
///
/// # Errors
///
/// Returns an error string when the task list cannot be read or written, or
/// the index is not in the list.
pub fn run(ws: &Workspace, ctx: &ServiceContext, action: &TodoAction) -> Result<(), String> {
    let memory = ws.memory(ctx)?;
    match action {
        TodoAction::List => {
            let todos = memory.load_todos().map_err(|e| e.to_string())?;
            if todos.is_empty() {
                println!("No tasks yet.");
            }
            for (i, item) in todos.iter().enumerate() {
                let line = format_item(i + 1, item);
                if item.is_done() {
                    println!("{}", line.dimmed());
                } else {
                    println!("{line}");
                }
            }
        }
        TodoAction::Add { task } => {
            memory.add_todo(task, PENDING).map_err(|e| e.to_string())?;
            println!("{} {task}", "Added:".green().bold());
        }
        TodoAction::Done { index } => {
            let zero_based = index.checked_sub(1).ok_or("task numbers start at 1")?;
            let item = memory.mark_complete(zero_based).map_err(|e| e.to_string())?;
            println!("{} {}", "Completed:".green().bold(), item.task);
        }
    }
    Ok(())
}
