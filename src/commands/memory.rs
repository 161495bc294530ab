//! `forgeplan memory` command.

use super::Workspace;
use crate::cli::MemoryAction;
use crate::context::ServiceContext;

/// Execute the `memory` command.
///
/// # Errors
///
/// Returns an error string when the memory file cannot be read or written.
pub fn run(ws: &Workspace, ctx: &ServiceContext, action: &MemoryAction) -> Result<(), String> {
    let memory = ws.memory(ctx)?;
    match action {
        MemoryAction::Show => {
            let facts = memory.load_memory().map_err(|e| e.to_string())?;
            if facts.is_empty() {
                println!("Project memory is empty.");
            } else {
                print!("{}", serde_yaml::to_string(&facts).map_err(|e| e.to_string())?);
            }
        }
        MemoryAction::Set { key, value } => {
            memory.update_memory(key, value).map_err(|e| e.to_string())?;
            println!("{key} = {value}");
        }
    }
    Ok(())
}
