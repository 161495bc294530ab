//! Typed project plans, validated once at the LLM boundary.
//!
//! The model answers with loosely shaped JSON. Everything downstream works on
//! [`ProjectPlan`] and [`DirNode`] instead, so shape checks happen here and
//! nowhere else.

use std::fmt::{self, Write as _};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Entries of one directory, in the order the plan listed them.
pub type Entries = IndexMap<String, DirNode>;

/// Task lists keyed by category, in plan order.
pub type TodoPlan = IndexMap<String, Vec<String>>;

/// Category used when the model returns a bare list of tasks.
pub const DEFAULT_CATEGORY: &str = "General";

/// Invalid plan or proposal payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// A required key is absent.
    #[error("plan is missing the {key:?} key")]
    MissingKey {
        /// The absent key.
        key: &'static str,
    },

    /// A value has the wrong shape.
    #[error("malformed plan at {at}: {reason}")]
    Malformed {
        /// Dotted location of the offending value.
        at: String,
        /// What was expected.
        reason: String,
    },
}

impl PlanError {
    fn malformed(at: &str, reason: impl Into<String>) -> Self {
        Self::Malformed { at: at.to_string(), reason: reason.into() }
    }
}

/// One node of a planned file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirNode {
    /// File payload.
    File(String),
    /// Sub-directory.
    Directory(Entries),
}

impl DirNode {
    /// Converts a JSON value into a tree.
    ///
    /// Strings are files, `null` is an empty file, objects are directories
    /// and an array of strings is a directory of empty files.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Malformed`] naming the first value of any other shape.
    pub fn from_value(value: &Value) -> Result<Self, PlanError> {
        node_from_value(value, "structure")
    }

    /// Number of file leaves in the tree.
    #[must_use]
    pub fn file_count(&self) -> usize {
        match self {
            DirNode::File(_) => 1,
            DirNode::Directory(entries) => entries.values().map(DirNode::file_count).sum(),
        }
    }

    /// Indented listing of the tree, directories suffixed with `/`.
    #[must_use]
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        if let DirNode::Directory(entries) = self {
            render_entries(entries, 0, &mut out);
        }
        out
    }
}

fn node_from_value(value: &Value, at: &str) -> Result<DirNode, PlanError> {
    match value {
        Value::String(content) => Ok(DirNode::File(content.clone())),
        Value::Null => Ok(DirNode::File(String::new())),
        Value::Object(map) => {
            let mut entries = Entries::with_capacity(map.len());
            for (name, child) in map {
                let child = node_from_value(child, &format!("{at}.{name}"))?;
                entries.insert(name.clone(), child);
            }
            Ok(DirNode::Directory(entries))
        }
        Value::Array(items) => {
            let mut entries = Entries::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let name = item
                    .as_str()
                    .ok_or_else(|| {
                        PlanError::malformed(&format!("{at}[{i}]"), "expected a file name")
                    })?;
                entries.insert(name.to_string(), DirNode::File(String::new()));
            }
            Ok(DirNode::Directory(entries))
        }
        Value::Bool(_) | Value::Number(_) => {
            Err(PlanError::malformed(at, "expected file content or a directory"))
        }
    }
}

fn render_entries(entries: &Entries, depth: usize, out: &mut String) {
    for (name, node) in entries {
        let indent = "  ".repeat(depth);
        match node {
            DirNode::Directory(children) => {
                let _ = writeln!(out, "{indent}{name}/");
                render_entries(children, depth + 1, out);
            }
            DirNode::File(_) => {
                let _ = writeln!(out, "{indent}{name}");
            }
        }
    }
}

/// A validated `{structure, todo}` plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPlan {
    /// Tree to materialize; always a directory at the root.
    pub structure: DirNode,
    /// Tasks to append to the TODO document.
    pub todo: TodoPlan,
}

impl ProjectPlan {
    /// Validates a model reply into a plan.
    ///
    /// # Errors
    ///
    /// Returns an error when `structure` or `todo` is missing, when
    /// `structure` is not an object, or when any nested value has an
    /// unsupported shape.
    pub fn from_value(value: &Value) -> Result<Self, PlanError> {
        let object =
            value.as_object().ok_or_else(|| PlanError::malformed("plan", "expected an object"))?;
        let structure = object.get("structure").ok_or(PlanError::MissingKey { key: "structure" })?;
        let todo = object.get("todo").ok_or(PlanError::MissingKey { key: "todo" })?;

        if !structure.is_object() {
            return Err(PlanError::malformed("structure", "expected an object"));
        }
        Ok(Self { structure: DirNode::from_value(structure)?, todo: todo_from_value(todo)? })
    }

    /// Total number of tasks across all categories.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.todo.values().map(Vec::len).sum()
    }

    /// Every task paired with its category, in plan order.
    pub fn tasks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.todo
            .iter()
            .flat_map(|(category, tasks)| {
                tasks.iter().map(move |t| (category.as_str(), t.as_str()))
            })
    }
}

impl fmt::Display for ProjectPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TODO:")?;
        for (category, tasks) in &self.todo {
            writeln!(f, "  {category}")?;
            for task in tasks {
                writeln!(f, "    - {task}")?;
            }
        }
        writeln!(f, "Structure:")?;
        for line in self.structure.render_tree().lines() {
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

fn todo_from_value(value: &Value) -> Result<TodoPlan, PlanError> {
    match value {
        Value::Object(map) => {
            let mut todo = TodoPlan::with_capacity(map.len());
            for (category, tasks) in map {
                todo.insert(category.clone(), task_list(tasks, &format!("todo.{category}"))?);
            }
            Ok(todo)
        }
        Value::Array(_) => {
            let mut todo = TodoPlan::new();
            todo.insert(DEFAULT_CATEGORY.to_string(), task_list(value, "todo")?);
            Ok(todo)
        }
        _ => Err(PlanError::malformed("todo", "expected an object of task lists")),
    }
}

fn task_list(value: &Value, at: &str) -> Result<Vec<String>, PlanError> {
    let items =
        value.as_array().ok_or_else(|| PlanError::malformed(at, "expected a list of tasks"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| {
                    PlanError::malformed(&format!("{at}[{i}]"), "expected a task string")
                })
        })
        .collect()
}

/// The model's `{name, stack}` proposal for a new project.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    /// Project name as proposed.
    pub name: String,
    /// Stack description; a string or a structured object.
    pub stack: Value,
}

impl Proposal {
    /// Validates a model reply into a proposal.
    ///
    /// # Errors
    ///
    /// Returns an error when `name` is missing or empty, or `stack` is missing.
    pub fn from_value(value: &Value) -> Result<Self, PlanError> {
        let name = value
            .get("name")
            .ok_or(PlanError::MissingKey { key: "name" })?
            .as_str()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PlanError::malformed("name", "expected a non-empty string"))?;
        let stack = value.get("stack").ok_or(PlanError::MissingKey { key: "stack" })?;
        Ok(Self { name: name.to_string(), stack: stack.clone() })
    }

    /// Directory name derived from the project name.
    #[must_use]
    pub fn slug(&self) -> String {
        slug(&self.name)
    }

    /// Stack rendered as Markdown text.
    #[must_use]
    pub fn stack_text(&self) -> String {
        render_stack(&self.stack)
    }
}

/// Lower-cases `name` and joins its alphanumeric runs with `-`.
#[must_use]
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for word in name.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push('-');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    if out.is_empty() {
        out.push_str("project");
    }
    out
}

/// Markdown rendering of a stack value.
///
/// Strings are used verbatim, lists are comma-joined, and objects become one
/// `- **key:** value` bullet per entry.
#[must_use]
pub fn render_stack(stack: &Value) -> String {
    match stack {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_stack).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("- **{key}:** {}", render_stack(value)))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
