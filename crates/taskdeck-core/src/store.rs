use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StorageError;
use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// Persistence collaborator the board talks to.
///
/// Implementations assign ids and creation timestamps on insert and return
/// listings newest first. Failures surface as [`StorageError`] and are never
/// retried by callers.
pub trait TaskStore {
    fn insert(&self, task: NewTask) -> Result<TaskId, StorageError>;

    fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<(), StorageError>;

    fn delete(&self, id: TaskId) -> Result<(), StorageError>;

    fn list(&self, owner: &str) -> Result<Vec<Task>, StorageError>;
}

/// JSON-lines file store. Every write rewrites `tasks.data` atomically.
#[derive(Debug)]
pub struct JsonlStore {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
}

impl JsonlStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|err| StorageError::io(&data_dir, err))?;

        let tasks_path = data_dir.join("tasks.data");
        if !tasks_path.exists() {
            fs::write(&tasks_path, "").map_err(|err| StorageError::io(&tasks_path, err))?;
        }

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            "opened task store"
        );

        Ok(Self {
            data_dir,
            tasks_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_all(&self) -> Result<Vec<Task>, StorageError> {
        load_jsonl(&self.tasks_path)
    }

    #[tracing::instrument(skip(self, tasks))]
    fn save_all(&self, tasks: &[Task]) -> Result<(), StorageError> {
        save_jsonl_atomic(&self.tasks_path, tasks)
    }
}

impl TaskStore for JsonlStore {
    #[tracing::instrument(skip(self, task), fields(owner = %task.owner))]
    fn insert(&self, task: NewTask) -> Result<TaskId, StorageError> {
        let mut tasks = self.load_all()?;
        let id = Uuid::new_v4();
        tasks.push(task.into_task(id, Utc::now()));
        self.save_all(&tasks)?;
        debug!(%id, count = tasks.len(), "task inserted");
        Ok(id)
    }

    #[tracing::instrument(skip(self, patch), fields(id = %id))]
    fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<(), StorageError> {
        let mut tasks = self.load_all()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StorageError::NotFound(id))?;
        task.apply_patch(patch);
        self.save_all(&tasks)?;
        debug!(?patch, "task updated");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    fn delete(&self, id: TaskId) -> Result<(), StorageError> {
        let mut tasks = self.load_all()?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(StorageError::NotFound(id));
        }
        self.save_all(&tasks)?;
        info!(before, after = tasks.len(), "task deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn list(&self, owner: &str) -> Result<Vec<Task>, StorageError> {
        let mut tasks: Vec<Task> = self
            .load_all()?
            .into_iter()
            .filter(|t| t.owner == owner)
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!(count = tasks.len(), "listed tasks");
        Ok(tasks)
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> Result<Vec<Task>, StorageError> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path).map_err(|err| StorageError::io(path, err))?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| StorageError::io(path, err))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let task: Task = serde_json::from_str(trimmed).map_err(|source| StorageError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        out.push(task);
    }

    debug!(count = out.len(), "loaded tasks from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, tasks))]
fn save_jsonl_atomic(path: &Path, tasks: &[Task]) -> Result<(), StorageError> {
    debug!(file = %path.display(), count = tasks.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir).map_err(|err| StorageError::io(dir, err))?;
    for task in tasks {
        let serialized = serde_json::to_string(task)?;
        writeln!(temp, "{serialized}").map_err(|err| StorageError::io(temp.path(), err))?;
    }
    temp.flush().map_err(|err| StorageError::io(temp.path(), err))?;

    temp.persist(path).map_err(|source| StorageError::Persist {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
