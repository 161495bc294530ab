//! Recursive application of a [`DirNode`] tree.

use std::path::{Component, Path, PathBuf};

use super::materialize::{Materializer, Mode, Outcome};
use super::MaterializeError;
use crate::plan::DirNode;

/// Everything that happened during one walk, in visit order.
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Per-file outcomes.
    pub outcomes: Vec<(PathBuf, Outcome)>,
    /// Directories that did not exist before the walk.
    pub directories: Vec<PathBuf>,
    /// Per-entry failures; siblings were still attempted.
    pub errors: Vec<(PathBuf, MaterializeError)>,
}

impl WalkReport {
    /// Whether the walk finished without any error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of files that ended with `outcome`.
    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }

    /// Outcome recorded for `path`, if it was visited.
    #[must_use]
    pub fn outcome_of(&self, path: &Path) -> Option<Outcome> {
        self.outcomes.iter().find(|(p, _)| p == path).map(|(_, o)| *o)
    }

    /// One-line tally, e.g. `2 created, 1 unchanged, 0 overwritten, 0 aborted, 0 errors`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} unchanged, {} overwritten, {} aborted, {} errors",
            self.count(Outcome::Created),
            self.count(Outcome::Unchanged),
            self.count(Outcome::Overwritten),
            self.count(Outcome::Aborted),
            self.errors.len()
        )
    }

    fn fail(&mut self, path: PathBuf, err: MaterializeError) {
        tracing::warn!(path = %path.display(), error = %err, "entry failed");
        self.errors.push((path, err));
    }
}

/// Walks a plan tree, creating directories and handing every leaf to a
/// [`Materializer`].
///
/// Leaves that already exist are updated in documentation mode only, so code
/// that predates the plan is never replaced wholesale.
pub struct StructureWalker<'m, 'a> {
    materializer: &'m Materializer<'a>,
}

impl<'m, 'a> StructureWalker<'m, 'a> {
    /// Creates a walker driving `materializer`.
    #[must_use]
    pub fn new(materializer: &'m Materializer<'a>) -> Self {
        Self { materializer }
    }

    /// Applies `node` at `base`.
    ///
    /// A directory node is materialized entry by entry beneath `base`; a
    /// file node is written to `base` itself. Errors never stop the walk.
    #[must_use]
    pub fn apply(&self, node: &DirNode, base: &Path) -> WalkReport {
        let mut report = WalkReport::default();
        match node {
            DirNode::Directory(entries) => {
                if self.ensure_dir(base, &mut report) {
                    self.walk(entries, base, &mut report);
                }
            }
            DirNode::File(content) => self.leaf(base, content, &mut report),
        }
        tracing::debug!(base = %base.display(), summary = %report.summary(), "walk finished");
        report
    }

    fn walk(&self, entries: &crate::plan::Entries, base: &Path, report: &mut WalkReport) {
        for (name, child) in entries {
            let path = match entry_path(base, name) {
                Ok(path) => path,
                Err(err) => {
                    report.fail(base.join(name), err);
                    continue;
                }
            };
            match child {
                DirNode::Directory(children) => {
                    if self.ensure_dir(&path, report) {
                        self.walk(children, &path, report);
                    }
                }
                DirNode::File(content) => self.leaf(&path, content, report),
            }
        }
    }

    fn ensure_dir(&self, path: &Path, report: &mut WalkReport) -> bool {
        let fs = self.materializer.fs();
        if fs.is_dir(path) {
            return true;
        }
        match fs.create_dir_all(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "directory created");
                report.directories.push(path.to_path_buf());
                true
            }
            Err(e) => {
                report.fail(path.to_path_buf(), MaterializeError::io(path, &*e));
                false
            }
        }
    }

    fn leaf(&self, path: &Path, content: &str, report: &mut WalkReport) {
        let mode =
            if self.materializer.fs().exists(path) { Mode::Document } else { Mode::Overwrite };
        match self.materializer.materialize(path, content, mode) {
            Ok(outcome) => report.outcomes.push((path.to_path_buf(), outcome)),
            Err(err) => report.fail(path.to_path_buf(), err),
        }
    }
}

/// Joins a plan entry name onto `base`, refusing names that could land
/// outside it.
fn entry_path(base: &Path, name: &str) -> Result<PathBuf, MaterializeError> {
    let escapes = || MaterializeError::PathEscapesRoot { name: name.to_string() };
    let mut normal = 0usize;
    for component in Path::new(name).components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(escapes());
            }
        }
    }
    if normal == 0 {
        return Err(escapes());
    }
    Ok(base.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::adapters::policy::{AlwaysApprove, ScriptedConfirmer};
    use crate::engine::{CommentStyleRegistry, Gate};
    use crate::ports::confirm::Confirmer;
    use crate::ports::filesystem::FileSystem;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> DirNode {
        DirNode::from_value(&value).unwrap()
    }

    fn walk(fs: &MemoryFileSystem, confirmer: &dyn Confirmer, node: &DirNode) -> WalkReport {
        let styles = CommentStyleRegistry::builtin();
        let materializer = Materializer::new(fs, Gate::new(confirmer, false), &styles);
        StructureWalker::new(&materializer).apply(node, Path::new("/proj"))
    }

    #[test]
    fn nested_file_in_empty_directory() {
        let fs = MemoryFileSystem::new();
        let confirmer = ScriptedConfirmer::new([]);

        let report = walk(&fs, &confirmer, &tree(json!({"src": {"main.txt": "hello"}})));

        assert!(report.is_clean());
        assert!(fs.is_dir(Path::new("/proj/src")));
        assert_eq!(fs.file("/proj/src/main.txt").as_deref(), Some("hello"));
        assert_eq!(report.outcome_of(Path::new("/proj/src/main.txt")), Some(Outcome::Created));
        assert_eq!(confirmer.prompts(), 0);
        assert_eq!(report.directories, vec![PathBuf::from("/proj"), PathBuf::from("/proj/src")]);
    }

    #[test]
    fn second_pass_writes_nothing() {
        let fs = MemoryFileSystem::new();
        let node = tree(json!({
            "README.md": "# Demo",
            "src": {"lib.rs": "pub fn demo() {}\n", "util": {"mod.py": "x = 1"}},
            "docs": {}
        }));
        let first = walk(&fs, &AlwaysApprove, &node);
        assert_eq!(first.count(Outcome::Created), 3);
        let writes = fs.writes();

        let confirmer = ScriptedConfirmer::new([]);
        let second = walk(&fs, &confirmer, &node);

        assert!(second.is_clean());
        assert_eq!(second.count(Outcome::Unchanged), 3);
        assert!(second.directories.is_empty());
        assert_eq!(fs.writes(), writes);
        assert_eq!(confirmer.prompts(), 0);
    }

    #[test]
    fn existing_file_gets_documentation_only() {
        let fs = MemoryFileSystem::new().with_file("/proj/app.py", "print('hi')\n");

        let report = walk(&fs, &AlwaysApprove, &tree(json!({"app.py": "Entry point."})));

        assert_eq!(report.outcome_of(Path::new("/proj/app.py")), Some(Outcome::Overwritten));
        assert_eq!(
            fs.file("/proj/app.py").as_deref(),
            Some("\"\"\"Entry point.\"\"\"\nprint('hi')\n")
        );
    }

    #[test]
    fn existing_file_without_style_fails_closed() {
        let fs = MemoryFileSystem::new().with_file("/proj/main.txt", "v1");

        let report = walk(&fs, &AlwaysApprove, &tree(json!({"main.txt": "v2"})));

        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0].1, MaterializeError::UnsupportedFileType { .. }));
        assert_eq!(fs.file("/proj/main.txt").as_deref(), Some("v1"));
    }

    #[test]
    fn failures_do_not_stop_siblings() {
        let fs = MemoryFileSystem::new().read_only("/proj/locked");

        let report = walk(
            &fs,
            &AlwaysApprove,
            &tree(json!({
                "locked": {"a.rs": "a"},
                "../escape.rs": "nope",
                "open": {"b.rs": "b"},
                "c.rs": "c"
            })),
        );

        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].0, PathBuf::from("/proj/locked"));
        assert!(matches!(report.errors[1].1, MaterializeError::PathEscapesRoot { .. }));
        assert_eq!(fs.file("/proj/open/b.rs").as_deref(), Some("b"));
        assert_eq!(fs.file("/proj/c.rs").as_deref(), Some("c"));
        assert!(fs.file("/proj/locked/a.rs").is_none());
        assert!(!report.is_clean());
    }

    #[test]
    fn refused_overwrites_are_reported_not_errors() {
        let fs = MemoryFileSystem::new().with_file("/proj/lib.rs", "fn a() {}\n");
        let confirmer = ScriptedConfirmer::new([false]);

        let report = walk(&fs, &confirmer, &tree(json!({"lib.rs": "Library root."})));

        assert!(report.is_clean());
        assert_eq!(report.count(Outcome::Aborted), 1);
        assert_eq!(fs.file("/proj/lib.rs").as_deref(), Some("fn a() {}\n"));
    }

    #[test]
    fn entry_names_are_validated() {
        let base = Path::new("/proj");
        assert_eq!(entry_path(base, "src/main.rs").unwrap(), PathBuf::from("/proj/src/main.rs"));
        assert!(entry_path(base, "./lib.rs").is_ok());
        assert!(entry_path(base, "").is_err());
        assert!(entry_path(base, ".").is_err());
        assert!(entry_path(base, "..").is_err());
        assert!(entry_path(base, "a/../../b").is_err());
        assert!(entry_path(base, "/etc/passwd").is_err());
    }

    #[test]
    fn summary_counts_everything() {
        let fs = MemoryFileSystem::new();
        let report = walk(&fs, &AlwaysApprove, &tree(json!({"a.rs": "", "b.rs": ""})));
        assert_eq!(report.summary(), "2 created, 0 unchanged, 0 overwritten, 0 aborted, 0 errors");
    }
}
