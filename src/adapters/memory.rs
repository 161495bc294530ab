//! In-memory filesystem adapter.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::ports::filesystem::FileSystem;

#[derive(Default)]
struct State {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    read_only: Vec<PathBuf>,
    writes: usize,
}

impl State {
    fn add_dirs(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn check_writable(&self, path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.read_only.iter().any(|p| path.starts_with(p)) {
            return Err(format!("permission denied: {}", path.display()).into());
        }
        for ancestor in path.ancestors().skip(1) {
            if self.files.contains_key(ancestor) {
                return Err(format!("not a directory: {}", ancestor.display()).into());
            }
        }
        Ok(())
    }
}

/// Filesystem held entirely in memory.
///
/// Keeps a count of mutating calls so callers can assert that an operation
/// wrote nothing, and can mark subtrees read-only to simulate permission
/// failures.
#[derive(Default)]
pub struct MemoryFileSystem {
    state: Mutex<State>,
}

impl MemoryFileSystem {
    /// Creates an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file (and its parent directories) without counting a write.
    pub fn with_file(self, path: impl AsRef<Path>, contents: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            let path = path.as_ref();
            if let Some(parent) = path.parent() {
                state.add_dirs(parent);
            }
            state.files.insert(path.to_path_buf(), contents.to_string());
        }
        self
    }

    /// Makes every path under `prefix` reject writes and directory creation.
    pub fn read_only(self, prefix: impl AsRef<Path>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.read_only.push(prefix.as_ref().to_path_buf());
        }
        self
    }

    /// Current contents of a file, if present.
    #[must_use]
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.files.get(path.as_ref()).cloned())
    }

    /// Number of file writes and appends performed so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.state.lock().map(|s| s.writes).unwrap_or_default()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let state = self.state.lock().map_err(|e| format!("fs lock poisoned: {e}"))?;
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| format!("File not found: {}", path.display()).into())
    }

    fn write(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.state.lock().map_err(|e| format!("fs lock poisoned: {e}"))?;
        state.check_writable(path)?;
        if state.dirs.contains(path) {
            return Err(format!("is a directory: {}", path.display()).into());
        }
        if let Some(parent) = path.parent() {
            state.add_dirs(parent);
        }
        state.files.insert(path.to_path_buf(), contents.to_string());
        state.writes += 1;
        Ok(())
    }

    fn append(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.state.lock().map_err(|e| format!("fs lock poisoned: {e}"))?;
        state.check_writable(path)?;
        if let Some(parent) = path.parent() {
            state.add_dirs(parent);
        }
        state.files.entry(path.to_path_buf()).or_default().push_str(contents);
        state.writes += 1;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.state.lock().map_err(|e| format!("fs lock poisoned: {e}"))?;
        if state.dirs.contains(path) {
            return Ok(());
        }
        if state.files.contains_key(path) {
            return Err(format!("file exists: {}", path.display()).into());
        }
        state.check_writable(path)?;
        state.add_dirs(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.state.lock().is_ok_and(|s| s.files.contains_key(path) || s.dirs.contains(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state.lock().is_ok_and(|s| s.dirs.contains(path))
    }
}
