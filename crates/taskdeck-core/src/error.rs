use std::path::PathBuf;

use crate::task::TaskId;

/// Input rejected before it reaches the store. Nothing has changed when one of
/// these is returned.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("goal text cannot be blank")]
    BlankGoal,
    #[error("task title cannot be blank")]
    BlankTitle,
    #[error("unknown status filter: {0} (expected all, pending or completed)")]
    InvalidStatusFilter(String),
    #[error("unknown sort order: {0} (expected latest or oldest)")]
    InvalidSortOrder(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing {path} line {line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed serializing task: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
