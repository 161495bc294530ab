//! Command dispatch and handlers.

pub mod build;
pub mod feature;
pub mod memory;
pub mod reset;
pub mod scaffold;
pub mod testgen;
pub mod todo;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::adapters::live::confirm::TerminalConfirmer;
use crate::adapters::policy::{AlwaysApprove, FailIfPrompted};
use crate::cli::{Cli, Command};
use crate::config::{CliOverrides, Config};
use crate::context::ServiceContext;
use crate::engine::{Gate, Materializer, Outcome, StructureWalker, TodoAppender, WalkReport};
use crate::plan::ProjectPlan;
use crate::ports::confirm::Confirmer;
use crate::session::{self, Assistant, ProjectMemory, SessionLog};

/// Printed when the user declines a command-level confirmation.
pub const ABORTED: &str = "Aborted by user.";

/// TODO document at the root of every project.
pub const TODO_DOCUMENT: &str = "TODO.md";

/// Where a command runs and how it asks.
pub struct Workspace {
    /// Project root.
    pub root: PathBuf,
    /// Resolved configuration.
    pub config: Config,
    /// Approve every gate without asking.
    pub force: bool,
}

impl Workspace {
    /// Workspace rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: Config, force: bool) -> Self {
        Self { root: root.into(), config, force }
    }

    /// State directory of the project root.
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        session::state_dir(&self.root)
    }

    /// Gate honouring `--yes`.
    #[must_use]
    pub fn gate<'a>(&self, ctx: &'a ServiceContext) -> Gate<'a> {
        Gate::new(ctx.confirm.as_ref(), self.force)
    }

    /// Assistant keeping its history in the root's state directory.
    #[must_use]
    pub fn assistant<'a>(&self, ctx: &'a ServiceContext) -> Assistant<'a> {
        let log = SessionLog::new(ctx.fs.as_ref(), &self.state_dir());
        Assistant::new(ctx.llm.as_ref(), log, self.config.assistant.clone())
    }

    /// Project memory of the project at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error when the state directory cannot be prepared.
    pub fn memory_at<'a>(
        &self,
        ctx: &'a ServiceContext,
        root: &Path,
    ) -> Result<ProjectMemory<'a>, String> {
        ProjectMemory::open(ctx.fs.as_ref(), &session::state_dir(root)).map_err(|e| e.to_string())
    }

    /// Project memory of the workspace root.
    ///
    /// # Errors
    ///
    /// Returns an error when the state directory cannot be prepared.
    pub fn memory<'a>(&self, ctx: &'a ServiceContext) -> Result<ProjectMemory<'a>, String> {
        self.memory_at(ctx, &self.root)
    }
}

/// Dispatch a parsed command to its handler.
///
/// When `FORGEPLAN_REPLAY` names a cassette, LLM replies come from it; when
/// `FORGEPLAN_RECORD` names a path, LLM traffic is recorded there.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let confirm: Box<dyn Confirmer> = if cli.yes {
        Box::new(AlwaysApprove)
    } else if cli.non_interactive {
        Box::new(FailIfPrompted)
    } else {
        Box::new(TerminalConfirmer::stdio())
    };
    let env = |key: &str| std::env::var(key).ok();
    let ctx = ServiceContext::from_env(env, confirm)?;

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()
            .map_err(|e| format!("cannot determine current directory: {e}"))?,
    };
    let overrides = CliOverrides { model: cli.model.clone() };
    let config = Config::resolve(ctx.fs.as_ref(), &root, &overrides, env)?;
    let ws = Workspace::new(root, config, cli.yes);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;
    runtime.block_on(dispatch_with_context(&cli.command, &ws, &ctx))
}

/// Dispatch a command with the given workspace and service context.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub async fn dispatch_with_context(
    command: &Command,
    ws: &Workspace,
    ctx: &ServiceContext,
) -> Result<(), String> {
    match command {
        Command::Build { idea } => build::run(ws, ctx, idea.as_deref()).await,
        Command::Scaffold { context } => scaffold::run(ws, ctx, context.as_deref()).await,
        Command::Feature { description } => feature::run(ws, ctx, description).await,
        Command::Tests { file, start, end, mode } => {
            let request =
                testgen::TestsRequest { file: file.clone(), start: *start, end: *end, mode: *mode };
            testgen::run(ws, ctx, &request).await
        }
        Command::Todo { action } => todo::run(ws, ctx, action),
        Command::Memory { action } => memory::run(ws, ctx, action),
        Command::Reset => reset::run(ws, ctx),
    }
}

/// Reads one line from stdin after printing `question`.
pub(crate) fn ask_line(question: &str) -> Result<String, String> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{question} ").and_then(|()| stdout.flush()).map_err(|e| e.to_string())?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).map_err(|e| e.to_string())?;
    let line = line.trim().to_string();
    if line.is_empty() {
        return Err("no input given".to_string());
    }
    Ok(line)
}

/// Asks a command-level question; refusal becomes [`ABORTED`].
pub(crate) fn require(gate: Gate<'_>, question: &str) -> Result<(), String> {
    match gate.confirm(question) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ABORTED.to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Walks `plan.structure` under `base`, then appends its tasks to the TODO
/// document and the memory task list of `base`.
///
/// TODO bookkeeping happens even when some files failed, so the tasks are
/// never lost; the walk errors are still returned.
pub(crate) fn apply_plan(
    ws: &Workspace,
    ctx: &ServiceContext,
    plan: &ProjectPlan,
    base: &Path,
) -> Result<WalkReport, String> {
    tracing::info!(
        files = plan.structure.file_count(),
        tasks = plan.task_count(),
        base = %base.display(),
        "applying plan"
    );
    let materializer = Materializer::new(ctx.fs.as_ref(), ws.gate(ctx), &ws.config.comment_styles);
    let report = StructureWalker::new(&materializer).apply(&plan.structure, base);
    print_report(&report, base);

    TodoAppender::new(ctx.fs.as_ref(), base.join(TODO_DOCUMENT))
        .append_plan(&plan.todo)
        .map_err(|e| e.to_string())?;
    let memory = ws.memory_at(ctx, base)?;
    for (_, task) in plan.tasks() {
        memory.add_todo(task, session::memory::PENDING).map_err(|e| e.to_string())?;
    }
    Ok(report)
}

/// Turns a walk with errors into a command failure.
pub(crate) fn ensure_clean(report: &WalkReport) -> Result<(), String> {
    if report.is_clean() {
        return Ok(());
    }
    let failed = report.errors.len();
    let noun = if failed == 1 { "entry" } else { "entries" };
    Err(format!("{failed} {noun} could not be materialized"))
}

fn print_report(report: &WalkReport, base: &Path) {
    for (path, outcome) in &report.outcomes {
        let shown = path.strip_prefix(base).unwrap_or(path).display().to_string();
        let label = match outcome {
            Outcome::Created => "created".green(),
            Outcome::Overwritten => "updated".yellow(),
            Outcome::Unchanged => "unchanged".dimmed(),
            Outcome::Aborted => "skipped".red(),
        };
        println!("  {label:>10}  {shown}");
    }
    for (path, err) in &report.errors {
        let shown = path.strip_prefix(base).unwrap_or(path).display().to_string();
        eprintln!("  {:>10}  {shown}: {err}", "error".red().bold());
    }
    println!("{}", report.summary().dimmed());
}
