//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI parser for `forgeplan`.
#[derive(Debug, Parser)]
#[command(
    name = "forgeplan",
    version,
    about = "Scaffold projects from an idea with an LLM, without clobbering existing work"
)]
pub struct Cli {
    /// Project root (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Approve every confirmation without asking.
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Fail instead of prompting when a confirmation is needed.
    #[arg(long, global = true, conflicts_with = "yes")]
    pub non_interactive: bool,

    /// Model identifier (overrides `FORGEPLAN_MODEL` and the config file).
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a new project from an idea.
    Build {
        /// The idea; asked for interactively when omitted.
        #[arg(long)]
        idea: Option<String>,
    },
    /// Add documentation headers and missing files to the existing project.
    Scaffold {
        /// Extra context for the model.
        #[arg(long)]
        context: Option<String>,
    },
    /// Plan and materialize a feature.
    Feature {
        /// What the feature should do.
        description: String,
    },
    /// Generate tests for a range of lines in a source file.
    Tests {
        /// Source file, relative to the project root.
        file: PathBuf,
        /// First line (1-based, inclusive).
        #[arg(long)]
        start: Option<usize>,
        /// Last line (1-based, inclusive).
        #[arg(long)]
        end: Option<usize>,
        /// What kind of tests to produce.
        #[arg(long, value_enum, default_value_t = TestMode::Stubs)]
        mode: TestMode,
    },
    /// Manage the project task list.
    Todo {
        /// Task list action.
        #[command(subcommand)]
        action: TodoAction,
    },
    /// Inspect or edit project memory.
    Memory {
        /// Memory action.
        #[command(subcommand)]
        action: MemoryAction,
    },
    /// Forget the conversation with the model.
    Reset,
}

/// Kind of generated tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestMode {
    /// Empty, well-named test functions.
    Stubs,
    /// A commented test plan.
    Specs,
    /// Complete tests.
    Full,
}

impl TestMode {
    /// Lower-case name, as accepted on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TestMode::Stubs => "stubs",
            TestMode::Specs => "specs",
            TestMode::Full => "full",
        }
    }
}

/// `todo` subcommands.
#[derive(Debug, Subcommand)]
pub enum TodoAction {
    /// Show every task with its 1-based index.
    List,
    /// Add a pending task.
    Add {
        /// Task text.
        task: String,
    },
    /// Mark a task done.
    Done {
        /// 1-based index from `todo list`.
        index: usize,
    },
}

/// `memory` subcommands.
#[derive(Debug, Subcommand)]
pub enum MemoryAction {
    /// Print the stored facts.
    Show,
    /// Store one fact.
    Set {
        /// Key to set.
        key: String,
        /// Value to store.
        value: String,
    },
}
