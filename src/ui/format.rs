//! Small formatting helpers for list rows.

use chrono::{DateTime, Utc};
use ratatui::prelude::Color;

use crate::store::Priority;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

/// Age of a task since creation: "3d", "2h", "15m", or "just now"
pub fn time_ago(created_at_ms: i64, now_ms: i64) -> String {
  let seconds = (now_ms - created_at_ms) / 1000;
  let minutes = seconds / 60;
  let hours = minutes / 60;
  let days = hours / 24;

  if days > 0 {
    format!("{}d", days)
  } else if hours > 0 {
    format!("{}h", hours)
  } else if minutes > 0 {
    format!("{}m", minutes)
  } else {
    "just now".to_string()
  }
}

/// State of a due date relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
  Overdue,
  Today,
  Upcoming,
}

/// Label and state for a due-date chip. Day comparison is in UTC, matching
/// how the form turns an entered date into a timestamp.
pub fn due_label(due_ms: i64, now_ms: i64) -> (String, DueState) {
  let due_day = DateTime::<Utc>::from_timestamp_millis(due_ms).map(|d| d.date_naive());
  let today = DateTime::<Utc>::from_timestamp_millis(now_ms).map(|d| d.date_naive());

  match (due_day, today) {
    (Some(due), Some(today)) if due == today => ("today".to_string(), DueState::Today),
    (Some(due), Some(today)) if due < today => {
      (due.format("%Y-%m-%d").to_string(), DueState::Overdue)
    }
    (Some(due), _) => (due.format("%Y-%m-%d").to_string(), DueState::Upcoming),
    // Out-of-range timestamp; show something rather than nothing
    _ => ("?".to_string(), DueState::Upcoming),
  }
}

/// Display color for a priority dot
pub fn priority_color(priority: Priority) -> Color {
  match priority {
    Priority::High => Color::Red,
    Priority::Medium => Color::Yellow,
    Priority::Low => Color::Green,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const DAY_MS: i64 = 24 * 60 * 60 * 1000;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_time_ago_buckets() {
    let now = 10 * DAY_MS;
    assert_eq!(time_ago(now - 3 * DAY_MS, now), "3d");
    assert_eq!(time_ago(now - 2 * 60 * 60 * 1000, now), "2h");
    assert_eq!(time_ago(now - 15 * 60 * 1000, now), "15m");
    assert_eq!(time_ago(now - 30 * 1000, now), "just now");
  }

  #[test]
  fn test_due_label_today() {
    let now = 1_700_000_000_000;
    let (label, state) = due_label(now, now);
    assert_eq!(label, "today");
    assert_eq!(state, DueState::Today);
  }

  #[test]
  fn test_due_label_overdue_and_upcoming() {
    let now = 1_700_000_000_000;
    let (_, overdue) = due_label(now - 2 * DAY_MS, now);
    assert_eq!(overdue, DueState::Overdue);

    let (_, upcoming) = due_label(now + 2 * DAY_MS, now);
    assert_eq!(upcoming, DueState::Upcoming);
  }

  #[test]
  fn test_priority_colors() {
    assert_eq!(priority_color(Priority::High), Color::Red);
    assert_eq!(priority_color(Priority::Medium), Color::Yellow);
    assert_eq!(priority_color(Priority::Low), Color::Green);
  }
}
