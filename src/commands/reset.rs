//! `forgeplan reset` command.

use super::Workspace;
use crate::context::ServiceContext;

/// Execute the `reset` command.
///
/// # Errors
///
/// Returns an error string when the session log cannot be written.
pub fn run(ws: &Workspace, ctx: &ServiceContext) -> Result<(), String> {
    ws.assistant(ctx).reset().map_err(|e| e.to_string())?;
    println!("Session history cleared.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::policy::FailIfPrompted;
    use crate::commands::test_support::setup;

    #[test]
    fn clears_existing_history() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".forgeplan")).unwrap();
        let session = dir.path().join(".forgeplan/session.json");
        std::fs::write(&session, r#"[{"role":"user","content":"hi"}]"#).unwrap();
        let (ws, ctx) = setup(dir.path(), &[], FailIfPrompted, false);

        run(&ws, &ctx).unwrap();

        assert_eq!(std::fs::read_to_string(&session).unwrap(), "[]");
    }
}
