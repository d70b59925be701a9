use tracing::{debug, info, instrument, warn};

use crate::error::{StorageError, ValidationError};
use crate::store::TaskStore;
use crate::suggest::{self, SuggestedTask};
use crate::task::{NewTask, Status, Task, TaskId, TaskPatch};
use crate::view::{self, Projection, ViewState};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("no task matches id: {0}")]
    UnknownTask(String),
    #[error("id prefix is ambiguous: {0}")]
    AmbiguousTask(String),
}

/// One owner's tasks as last fetched from the store.
///
/// Every successful mutation refetches the full listing, so the cached
/// collection never drifts from what the store holds.
#[derive(Debug)]
pub struct TaskBoard<S: TaskStore> {
    store: S,
    owner: String,
    tasks: Vec<Task>,
}

impl<S: TaskStore> TaskBoard<S> {
    #[instrument(skip(store))]
    pub fn open(store: S, owner: &str) -> Result<Self, StorageError> {
        let mut board = Self {
            store,
            owner: owner.to_string(),
            tasks: vec![],
        };
        board.refresh()?;
        Ok(board)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Newest first, as returned by the store.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    #[instrument(skip(self), fields(owner = %self.owner))]
    pub fn refresh(&mut self) -> Result<(), StorageError> {
        self.tasks = self.store.list(&self.owner)?;
        debug!(count = self.tasks.len(), "board refreshed");
        Ok(())
    }

    #[instrument(skip(self, title, notes))]
    pub fn create_task(
        &mut self,
        title: &str,
        notes: Option<&str>,
    ) -> Result<TaskId, BoardError> {
        require_title(title)?;
        let id = self.store.insert(NewTask::pending(
            title.to_string(),
            notes.map(str::to_string),
            &self.owner,
        ))?;
        info!(%id, "task created");
        self.refresh()?;
        Ok(id)
    }

    #[instrument(skip(self, title, notes), fields(id = %id))]
    pub fn edit_task(
        &mut self,
        id: TaskId,
        title: &str,
        notes: Option<&str>,
    ) -> Result<(), BoardError> {
        require_title(title)?;
        let patch = TaskPatch::content(title.to_string(), notes.map(str::to_string));
        self.store.update(id, &patch)?;
        info!("task updated");
        self.refresh()?;
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    pub fn set_status(&mut self, id: TaskId, status: Status) -> Result<(), BoardError> {
        self.store.update(id, &TaskPatch::status(status))?;
        info!(%status, "task status changed");
        self.refresh()?;
        Ok(())
    }

    /// Flips pending/completed based on the cached status. Returns the new
    /// status.
    #[instrument(skip(self), fields(id = %id))]
    pub fn toggle_status(&mut self, id: TaskId) -> Result<Status, BoardError> {
        let current = self
            .get(id)
            .map(|task| task.status)
            .ok_or(StorageError::NotFound(id))?;
        let next = current.toggled();
        self.set_status(id, next)?;
        Ok(next)
    }

    #[instrument(skip(self), fields(id = %id))]
    pub fn delete_task(&mut self, id: TaskId) -> Result<(), BoardError> {
        self.store.delete(id)?;
        info!("task deleted");
        self.refresh()?;
        Ok(())
    }

    /// Suggestions for a goal. Nothing is stored.
    #[instrument(skip(self))]
    pub fn suggest(&self, goal: &str) -> Result<Vec<SuggestedTask>, BoardError> {
        if goal.trim().is_empty() {
            warn!("rejected blank goal");
            return Err(ValidationError::BlankGoal.into());
        }
        let tasks = suggest::generate(goal);
        debug!(count = tasks.len(), "generated suggestions");
        Ok(tasks)
    }

    /// Stores one suggestion as a pending task. Saving the same suggestion
    /// twice creates two tasks.
    #[instrument(skip(self, suggestion), fields(title = %suggestion.title))]
    pub fn save_suggestion(&mut self, suggestion: &SuggestedTask) -> Result<TaskId, BoardError> {
        let id = self.store.insert(NewTask::pending(
            suggestion.title.clone(),
            Some(suggestion.notes.clone()),
            &self.owner,
        ))?;
        info!(%id, "suggestion saved");
        self.refresh()?;
        Ok(id)
    }

    pub fn project(&self, view: &ViewState) -> Projection {
        view::project(&self.tasks, view)
    }

    /// Accepts a full id or a unique prefix of its hyphenated form.
    pub fn resolve_id(&self, text: &str) -> Result<TaskId, BoardError> {
        let needle = text.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(BoardError::UnknownTask(text.to_string()));
        }
        if let Ok(id) = TaskId::parse_str(&needle) {
            return self
                .get(id)
                .map(|task| task.id)
                .ok_or_else(|| BoardError::UnknownTask(text.to_string()));
        }

        let mut hits = self
            .tasks
            .iter()
            .filter(|task| task.id.to_string().starts_with(&needle));
        let first = hits
            .next()
            .ok_or_else(|| BoardError::UnknownTask(text.to_string()))?;
        if hits.next().is_some() {
            return Err(BoardError::AmbiguousTask(text.to_string()));
        }
        Ok(first.id)
    }
}

fn require_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        warn!("rejected blank title");
        return Err(ValidationError::BlankTitle);
    }
    Ok(())
}
