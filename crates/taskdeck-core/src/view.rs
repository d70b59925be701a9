use std::fmt;
use std::str::FromStr;

use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::error::ValidationError;
use crate::task::{
  Status,
  Task
};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
  #[default]
  All,
  Pending,
  Completed
}

impl StatusFilter {
  pub fn admits(
    self,
    status: Status
  ) -> bool {
    match self {
      | StatusFilter::All => true,
      | StatusFilter::Pending => {
        status == Status::Pending
      }
      | StatusFilter::Completed => {
        status == Status::Completed
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | StatusFilter::All => "all",
      | StatusFilter::Pending => {
        "pending"
      }
      | StatusFilter::Completed => {
        "completed"
      }
    }
  }
}

impl FromStr for StatusFilter {
  type Err = ValidationError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(StatusFilter::All),
      | "pending" => {
        Ok(StatusFilter::Pending)
      }
      | "completed" => {
        Ok(StatusFilter::Completed)
      }
      | _ => Err(
        ValidationError::InvalidStatusFilter(
          s.to_string()
        )
      )
    }
  }
}

impl fmt::Display for StatusFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Latest,
  Oldest
}

impl SortOrder {
  pub fn as_str(self) -> &'static str {
    match self {
      | SortOrder::Latest => "latest",
      | SortOrder::Oldest => "oldest"
    }
  }
}

impl FromStr for SortOrder {
  type Err = ValidationError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "latest" => {
        Ok(SortOrder::Latest)
      }
      | "oldest" => {
        Ok(SortOrder::Oldest)
      }
      | _ => Err(
        ValidationError::InvalidSortOrder(
          s.to_string()
        )
      )
    }
  }
}

impl fmt::Display for SortOrder {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Search, status and sort selection
/// for one listing.
#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct ViewState {
  pub search: String,
  pub status: StatusFilter,
  pub sort:   SortOrder
}

impl ViewState {
  fn search_needle(
    &self
  ) -> Option<String> {
    if self.search.trim().is_empty() {
      None
    } else {
      Some(self.search.to_lowercase())
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct TaskStats {
  pub total:           usize,
  pub completed:       usize,
  pub pending:         usize,
  /// Whole percent, half rounds up.
  pub completion_rate: u32
}

impl TaskStats {
  pub fn from_tasks(
    tasks: &[Task]
  ) -> Self {
    let total = tasks.len();
    let completed = tasks
      .iter()
      .filter(|task| task.is_completed())
      .count();

    Self {
      total,
      completed,
      pending: total - completed,
      completion_rate: completion_rate(
        completed, total
      )
    }
  }
}

fn completion_rate(
  completed: usize,
  total: usize
) -> u32 {
  if total == 0 {
    return 0;
  }
  // floor(completed * 100 / total + 1/2)
  // in integers.
  let rate = (completed * 200 + total)
    / (2 * total);
  u32::try_from(rate).unwrap_or(100)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
  pub tasks: Vec<Task>,
  pub stats: TaskStats
}

/// Filter and sort `tasks` for
/// display. Statistics always cover the
/// full collection, not the filtered
/// view.
#[tracing::instrument(skip(
  tasks, view
), fields(
  count = tasks.len(),
  status = %view.status,
  sort = %view.sort
))]
pub fn project(
  tasks: &[Task],
  view: &ViewState
) -> Projection {
  let mut visible =
    filter_tasks(tasks, view);
  sort_tasks(&mut visible, view.sort);

  trace!(
    visible = visible.len(),
    "projected task view"
  );

  Projection {
    tasks: visible,
    stats: TaskStats::from_tasks(tasks)
  }
}

pub fn filter_tasks(
  tasks: &[Task],
  view: &ViewState
) -> Vec<Task> {
  let needle = view.search_needle();

  tasks
    .iter()
    .filter(|task| {
      view.status.admits(task.status)
    })
    .filter(|task| {
      needle.as_deref().is_none_or(
        |needle| {
          matches_search(task, needle)
        }
      )
    })
    .cloned()
    .collect()
}

/// Stable: tasks created at the same
/// instant keep their relative order.
pub fn sort_tasks(
  tasks: &mut [Task],
  order: SortOrder
) {
  match order {
    | SortOrder::Latest => {
      tasks.sort_by(|a, b| {
        b.created_at.cmp(&a.created_at)
      })
    }
    | SortOrder::Oldest => {
      tasks.sort_by(|a, b| {
        a.created_at.cmp(&b.created_at)
      })
    }
  }
}

// Absent notes never match.
fn matches_search(
  task: &Task,
  needle: &str
) -> bool {
  task
    .title
    .to_lowercase()
    .contains(needle)
    || task.notes.as_deref().is_some_and(
      |notes| {
        notes
          .to_lowercase()
          .contains(needle)
      }
    )
}
