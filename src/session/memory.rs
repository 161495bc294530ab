//! Project memory: a YAML task list and a YAML key/value map.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::StateError;
use crate::ports::filesystem::FileSystem;

/// Task list file inside the state directory.
pub const TODO_FILE: &str = "todo.yml";
/// Key/value file inside the state directory.
pub const MEMORY_FILE: &str = "memory.yml";

/// Status given to new tasks.
pub const PENDING: &str = "pending";
/// Status of finished tasks.
pub const DONE: &str = "done";

/// One tracked task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Task text.
    pub task: String,
    /// Free-form status, `pending` or `done` in practice.
    #[serde(default = "pending")]
    pub status: String,
}

fn pending() -> String {
    PENDING.to_string()
}

impl TodoItem {
    /// Whether the task is finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == DONE
    }
}

/// Free-form project facts (name, idea, stack, anything the user sets).
pub type MemoryMap = IndexMap<String, serde_yaml::Value>;

/// Read-modify-write access to the two memory files.
pub struct ProjectMemory<'a> {
    fs: &'a dyn FileSystem,
    todo_path: PathBuf,
    memory_path: PathBuf,
}

impl<'a> ProjectMemory<'a> {
    /// Opens the memory in `state_dir`, creating the directory and empty
    /// files when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or a default file cannot be created.
    pub fn open(fs: &'a dyn FileSystem, state_dir: &Path) -> Result<Self, StateError> {
        fs.create_dir_all(state_dir).map_err(|e| StateError::io(state_dir, &*e))?;
        let memory = Self {
            fs,
            todo_path: state_dir.join(TODO_FILE),
            memory_path: state_dir.join(MEMORY_FILE),
        };
        if !fs.exists(&memory.todo_path) {
            memory.save_todos(&[])?;
        }
        if !fs.exists(&memory.memory_path) {
            memory.save_memory(&MemoryMap::new())?;
        }
        Ok(memory)
    }

    /// All tasks, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load_todos(&self) -> Result<Vec<TodoItem>, StateError> {
        self.read_yaml(&self.todo_path)
    }

    /// Replaces the task list.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save_todos(&self, todos: &[TodoItem]) -> Result<(), StateError> {
        self.write_yaml(&self.todo_path, &todos)
    }

    /// Appends a task with `status`.
    ///
    /// # Errors
    ///
    /// Returns an error when the list cannot be loaded or saved.
    pub fn add_todo(&self, task: &str, status: &str) -> Result<(), StateError> {
        let mut todos = self.load_todos()?;
        todos.push(TodoItem { task: task.to_string(), status: status.to_string() });
        self.save_todos(&todos)
    }

    /// Sets `status` on every task whose text equals `task`. Returns how many
    /// matched.
    ///
    /// # Errors
    ///
    /// Returns an error when the list cannot be loaded or saved.
    pub fn update_todo_status(&self, task: &str, status: &str) -> Result<usize, StateError> {
        let mut todos = self.load_todos()?;
        let mut matched = 0;
        for item in todos.iter_mut().filter(|t| t.task == task) {
            item.status = status.to_string();
            matched += 1;
        }
        self.save_todos(&todos)?;
        Ok(matched)
    }

    /// Marks the task at zero-based `index` done and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NoSuchTask`] when `index` is out of range.
    pub fn mark_complete(&self, index: usize) -> Result<TodoItem, StateError> {
        let mut todos = self.load_todos()?;
        let len = todos.len();
        let item = todos.get_mut(index).ok_or(StateError::NoSuchTask { index, len })?;
        item.status = DONE.to_string();
        let done = item.clone();
        self.save_todos(&todos)?;
        Ok(done)
    }

    /// The whole key/value map.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load_memory(&self) -> Result<MemoryMap, StateError> {
        self.read_yaml(&self.memory_path)
    }

    /// Replaces the key/value map.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save_memory(&self, memory: &MemoryMap) -> Result<(), StateError> {
        self.write_yaml(&self.memory_path, memory)
    }

    /// Sets one key, keeping the others.
    ///
    /// # Errors
    ///
    /// Returns an error when the map cannot be loaded, `value` cannot be
    /// represented as YAML, or the map cannot be saved.
    pub fn update_memory<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StateError> {
        let value = serde_yaml::to_value(value)
            .map_err(|e| StateError::corrupt(&self.memory_path, &e))?;
        let mut memory = self.load_memory()?;
        memory.insert(key.to_string(), value);
        self.save_memory(&memory)
    }

    fn read_yaml<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T, StateError> {
        let raw = self.fs.read_to_string(path).map_err(|e| StateError::io(path, &*e))?;
        let value: Option<T> =
            serde_yaml::from_str(&raw).map_err(|e| StateError::corrupt(path, &e))?;
        Ok(value.unwrap_or_default())
    }

    fn write_yaml<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StateError> {
        let yaml = serde_yaml::to_string(value).map_err(|e| StateError::corrupt(path, &e))?;
        self.fs.write(path, &yaml).map_err(|e| StateError::io(path, &*e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;

    const DIR: &str = "/p/.forgeplan";

    #[test]
    fn open_creates_default_files() {
        let fs = MemoryFileSystem::new();
        let memory = ProjectMemory::open(&fs, Path::new(DIR)).unwrap();

        assert!(fs.file("/p/.forgeplan/todo.yml").is_some());
        assert!(fs.file("/p/.forgeplan/memory.yml").is_some());
        assert!(memory.load_todos().unwrap().is_empty());
        assert!(memory.load_memory().unwrap().is_empty());
    }

    #[test]
    fn open_keeps_existing_files() {
        let fs = MemoryFileSystem::new()
            .with_file("/p/.forgeplan/todo.yml", "- task: keep me\n  status: pending\n");
        let memory = ProjectMemory::open(&fs, Path::new(DIR)).unwrap();

        assert_eq!(memory.load_todos().unwrap()[0].task, "keep me");
    }

    #[test]
    fn add_and_update_todos() {
        let fs = MemoryFileSystem::new();
        let memory = ProjectMemory::open(&fs, Path::new(DIR)).unwrap();

        memory.add_todo("write docs", PENDING).unwrap();
        memory.add_todo("ship", PENDING).unwrap();
        memory.add_todo("write docs", PENDING).unwrap();
        let matched = memory.update_todo_status("write docs", "blocked").unwrap();

        let todos = memory.load_todos().unwrap();
        assert_eq!(matched, 2);
        assert_eq!(todos[0].status, "blocked");
        assert_eq!(todos[1].status, PENDING);
        assert_eq!(todos[2].status, "blocked");
    }

    #[test]
    fn mark_complete_by_index() {
        let fs = MemoryFileSystem::new();
        let memory = ProjectMemory::open(&fs, Path::new(DIR)).unwrap();
        memory.add_todo("a", PENDING).unwrap();
        memory.add_todo("b", PENDING).unwrap();

        let done = memory.mark_complete(1).unwrap();

        assert_eq!(done.task, "b");
        assert!(memory.load_todos().unwrap()[1].is_done());
        assert!(!memory.load_todos().unwrap()[0].is_done());
    }

    #[test]
    fn mark_complete_out_of_range() {
        let fs = MemoryFileSystem::new();
        let memory = ProjectMemory::open(&fs, Path::new(DIR)).unwrap();
        memory.add_todo("a", PENDING).unwrap();

        let err = memory.mark_complete(3).unwrap_err();

        assert!(matches!(err, StateError::NoSuchTask { index: 3, len: 1 }));
        assert_eq!(err.to_string(), "no task #4; the list has 1 task(s)");
    }

    #[test]
    fn missing_status_defaults_to_pending() {
        let fs = MemoryFileSystem::new().with_file("/p/.forgeplan/todo.yml", "- task: legacy\n");
        let memory = ProjectMemory::open(&fs, Path::new(DIR)).unwrap();

        assert_eq!(memory.load_todos().unwrap()[0].status, PENDING);
    }

    #[test]
    fn update_memory_keeps_other_keys() {
        let fs = MemoryFileSystem::new();
        let memory = ProjectMemory::open(&fs, Path::new(DIR)).unwrap();

        memory.update_memory("name", "Demo").unwrap();
        memory.update_memory("stack", &serde_json::json!({"Language": ["Rust"]})).unwrap();
        memory.update_memory("name", "Renamed").unwrap();

        let map = memory.load_memory().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["name", "stack"]);
        assert_eq!(map["name"], serde_yaml::Value::from("Renamed"));
        assert_eq!(map["stack"]["Language"][0], serde_yaml::Value::from("Rust"));
    }

    #[test]
    fn corrupt_yaml_is_reported() {
        let fs = MemoryFileSystem::new().with_file("/p/.forgeplan/memory.yml", "key: [unclosed");
        let memory = ProjectMemory::open(&fs, Path::new(DIR)).unwrap();

        assert!(matches!(memory.load_memory().unwrap_err(), StateError::Corrupt { .. }));
    }
}
