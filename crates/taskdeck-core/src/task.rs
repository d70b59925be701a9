use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Completed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Status::Pending => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "completed" | "done" => Ok(Status::Completed),
            other => Err(anyhow::anyhow!("unknown task status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,

    pub owner: String,

    pub title: String,

    #[serde(default)]
    pub notes: Option<String>,

    pub status: Status,

    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Hyphenated id truncated to the width the table shows.
    pub fn short_id(&self) -> String {
        let full = self.id.to_string();
        full[..8].to_string()
    }

    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes = normalize_notes(notes.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Insert payload. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub owner: String,
    pub status: Status,
}

impl NewTask {
    pub fn pending(title: String, notes: Option<String>, owner: &str) -> Self {
        Self {
            title,
            notes: normalize_notes(notes),
            owner: owner.to_string(),
            status: Status::Pending,
        }
    }

    pub fn into_task(self, id: TaskId, created_at: DateTime<Utc>) -> Task {
        Task {
            id,
            owner: self.owner,
            title: self.title,
            notes: normalize_notes(self.notes),
            status: self.status,
            created_at,
        }
    }
}

/// Partial update. `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<Option<String>>,
    pub status: Option<Status>,
}

impl TaskPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn content(title: String, notes: Option<String>) -> Self {
        Self {
            title: Some(title),
            notes: Some(notes),
            status: None,
        }
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample() -> Task {
        NewTask::pending("Book venue".to_string(), Some("call first".to_string()), "ana")
            .into_task(Uuid::new_v4(), Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn blank_notes_are_stored_as_absent() {
        let task = NewTask::pending("t".to_string(), Some("   ".to_string()), "ana");
        assert_eq!(task.notes, None);
    }

    #[test]
    fn patch_touches_only_given_fields() {
        let mut task = sample();
        task.apply_patch(&TaskPatch::status(Status::Completed));
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.title, "Book venue");
        assert_eq!(task.notes.as_deref(), Some("call first"));

        task.apply_patch(&TaskPatch {
            notes: Some(None),
            ..TaskPatch::default()
        });
        assert_eq!(task.notes, None);
        assert_eq!(task.status, Status::Completed);
    }

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!("Completed".parse::<Status>().unwrap(), Status::Completed);
        assert_eq!(Status::Pending.toggled(), Status::Completed);
        assert!("archived".parse::<Status>().is_err());

        let json = serde_json::to_string(&Status::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
