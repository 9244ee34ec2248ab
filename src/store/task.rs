//! The task record and its derived orderings.

use serde::{Deserialize, Serialize};

/// A single task. This is the only entity that is ever persisted; the
/// serialized field names are camelCase so the on-disk slot stays readable
/// as a plain JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  /// Opaque unique id, assigned at creation and never reassigned
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub completed: bool,
  /// Milliseconds since the Unix epoch, immutable after creation
  pub created_at: i64,
  /// Absent means "no due date"
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub due_date: Option<i64>,
  #[serde(default)]
  pub priority: Priority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

impl Priority {
  /// Display rank: high sorts before medium sorts before low.
  pub fn rank(self) -> u8 {
    match self {
      Priority::High => 0,
      Priority::Medium => 1,
      Priority::Low => 2,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Priority::Low => "low",
      Priority::Medium => "medium",
      Priority::High => "high",
    }
  }

  /// Next priority when cycling forward in the form (low → medium → high → low).
  pub fn next(self) -> Self {
    match self {
      Priority::Low => Priority::Medium,
      Priority::Medium => Priority::High,
      Priority::High => Priority::Low,
    }
  }

  pub fn prev(self) -> Self {
    match self {
      Priority::Low => Priority::High,
      Priority::Medium => Priority::Low,
      Priority::High => Priority::Medium,
    }
  }
}

/// A partial update to a task. `None` fields are left untouched;
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub priority: Option<Priority>,
  pub due_date: Option<Option<i64>>,
}

/// Status filter for list projections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
  #[default]
  All,
  Active,
  Completed,
}

impl StatusFilter {
  pub fn matches(self, task: &Task) -> bool {
    match self {
      StatusFilter::All => true,
      StatusFilter::Active => !task.completed,
      StatusFilter::Completed => task.completed,
    }
  }

  pub fn cycle(self) -> Self {
    match self {
      StatusFilter::All => StatusFilter::Active,
      StatusFilter::Active => StatusFilter::Completed,
      StatusFilter::Completed => StatusFilter::All,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      StatusFilter::All => "all",
      StatusFilter::Active => "active",
      StatusFilter::Completed => "completed",
    }
  }
}

/// Order tasks for display: incomplete before completed, and within each
/// group high priority before medium before low. The sort is stable, so
/// ties keep their relative storage order (newest-first).
pub fn sort_for_display(tasks: &mut [Task]) {
  tasks.sort_by_key(|t| (t.completed, t.priority.rank()));
}
