//! The task store: owns the in-memory collection and mirrors it to the
//! persistent slot after every mutation.

use color_eyre::{eyre::eyre, Result};
use tracing::warn;
use uuid::Uuid;

use super::slot::StorageSlot;
use super::task::{Priority, StatusFilter, Task, TaskPatch};

/// Owns the task collection and its durable mirror.
///
/// Storage order is newest-first: `add` prepends. Display order is derived
/// separately via [`super::task::sort_for_display`].
pub struct TaskStore<S: StorageSlot> {
  slot: S,
  tasks: Vec<Task>,
}

impl<S: StorageSlot> TaskStore<S> {
  /// Hydrate the collection from the slot. A missing slot yields an empty
  /// collection; a read or parse failure is logged and also yields an empty
  /// collection (fails open, never fatal).
  pub fn open(slot: S) -> Self {
    let tasks = match slot.read() {
      Ok(Some(contents)) => match serde_json::from_str::<Vec<Task>>(&contents) {
        Ok(tasks) => tasks,
        Err(e) => {
          warn!("Ignoring malformed task slot: {}", e);
          Vec::new()
        }
      },
      Ok(None) => Vec::new(),
      Err(e) => {
        warn!("Failed to read task slot: {}", e);
        Vec::new()
      }
    };

    Self { slot, tasks }
  }

  /// Add a new task at the front of the collection.
  ///
  /// Rejects a title that trims to empty; in that case neither the
  /// collection nor the slot is touched.
  pub fn add(
    &mut self,
    title: &str,
    description: &str,
    priority: Priority,
    due_date: Option<i64>,
  ) -> Result<Task> {
    let title = title.trim();
    if title.is_empty() {
      return Err(eyre!("Title cannot be empty"));
    }

    let task = Task {
      id: Uuid::new_v4().to_string(),
      title: title.to_string(),
      description: description.to_string(),
      completed: false,
      created_at: chrono::Utc::now().timestamp_millis(),
      due_date,
      priority,
    };

    self.tasks.insert(0, task.clone());
    self.persist()?;
    Ok(task)
  }

  /// Flip the completed flag on the matching task. Unknown ids are a no-op
  /// and do not rewrite the slot.
  pub fn toggle(&mut self, id: &str) -> Result<()> {
    let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
      return Ok(());
    };
    task.completed = !task.completed;
    self.persist()
  }

  /// Merge the patch into the matching task. Fields left `None` in the patch
  /// are preserved; unknown ids are a no-op.
  pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<()> {
    if let Some(title) = &patch.title {
      if title.trim().is_empty() {
        return Err(eyre!("Title cannot be empty"));
      }
    }

    let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
      return Ok(());
    };

    if let Some(title) = patch.title {
      task.title = title.trim().to_string();
    }
    if let Some(description) = patch.description {
      task.description = description;
    }
    if let Some(priority) = patch.priority {
      task.priority = priority;
    }
    if let Some(due_date) = patch.due_date {
      task.due_date = due_date;
    }

    self.persist()
  }

  /// Delete the matching task. Unknown ids are a no-op.
  pub fn remove(&mut self, id: &str) -> Result<()> {
    let before = self.tasks.len();
    self.tasks.retain(|t| t.id != id);
    if self.tasks.len() == before {
      return Ok(());
    }
    self.persist()
  }

  /// Pure projection of the collection by completion status.
  pub fn filter(&self, filter: StatusFilter) -> Vec<&Task> {
    self.tasks.iter().filter(|t| filter.matches(t)).collect()
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  /// (open, done) counts for the header.
  pub fn counts(&self) -> (usize, usize) {
    let done = self.tasks.iter().filter(|t| t.completed).count();
    (self.tasks.len() - done, done)
  }

  /// Rewrite the whole collection into the slot. The in-memory collection
  /// keeps the mutation even when the write fails; the error is surfaced to
  /// the caller.
  fn persist(&self) -> Result<()> {
    let contents = serde_json::to_string(&self.tasks)?;
    self.slot.write(&contents)
  }
}

#[cfg(test)]
mod tests {
  use super::super::slot::MemorySlot;
  use super::*;

  fn empty_store() -> TaskStore<MemorySlot> {
    TaskStore::open(MemorySlot::new())
  }

  #[test]
  fn test_add_prepends_newest_first() {
    let mut store = empty_store();
    store.add("first", "", Priority::Medium, None).unwrap();
    store.add("second", "", Priority::Medium, None).unwrap();

    let titles: Vec<&str> = store.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["second", "first"]);
  }

  #[test]
  fn test_add_defaults() {
    let mut store = empty_store();
    let task = store.add("buy milk", "2%", Priority::High, None).unwrap();

    assert!(!task.completed);
    assert!(task.created_at > 0);
    assert_eq!(task.due_date, None);
    assert_eq!(task.priority, Priority::High);
  }

  #[test]
  fn test_add_rejects_whitespace_title() {
    let slot = MemorySlot::new();
    let observer = slot.shared();
    let mut store = TaskStore::open(slot);

    assert!(store.add("   ", "", Priority::Medium, None).is_err());
    assert!(store.tasks().is_empty());
    // Nothing was written to the slot either
    assert_eq!(observer.contents(), None);
  }

  #[test]
  fn test_add_assigns_unique_ids() {
    let mut store = empty_store();
    let a = store.add("a", "", Priority::Medium, None).unwrap();
    let b = store.add("b", "", Priority::Medium, None).unwrap();
    assert_ne!(a.id, b.id);
  }

  #[test]
  fn test_toggle_flips_and_unknown_id_is_noop() {
    let mut store = empty_store();
    let task = store.add("a", "", Priority::Medium, None).unwrap();

    store.toggle(&task.id).unwrap();
    assert!(store.tasks()[0].completed);

    store.toggle(&task.id).unwrap();
    assert!(!store.tasks()[0].completed);

    store.toggle("no-such-id").unwrap();
    assert_eq!(store.tasks().len(), 1);
  }

  #[test]
  fn test_update_merges_partial_fields() {
    let mut store = empty_store();
    let task = store.add("title", "desc", Priority::Medium, Some(10)).unwrap();

    store
      .update(
        &task.id,
        TaskPatch {
          title: Some("new title".to_string()),
          priority: Some(Priority::Low),
          ..Default::default()
        },
      )
      .unwrap();

    let updated = &store.tasks()[0];
    assert_eq!(updated.title, "new title");
    assert_eq!(updated.priority, Priority::Low);
    // Unspecified fields are preserved
    assert_eq!(updated.description, "desc");
    assert_eq!(updated.due_date, Some(10));
    assert_eq!(updated.created_at, task.created_at);
    assert_eq!(updated.id, task.id);
  }

  #[test]
  fn test_update_clears_due_date() {
    let mut store = empty_store();
    let task = store.add("a", "", Priority::Medium, Some(42)).unwrap();

    store
      .update(
        &task.id,
        TaskPatch {
          due_date: Some(None),
          ..Default::default()
        },
      )
      .unwrap();

    assert_eq!(store.tasks()[0].due_date, None);
  }

  #[test]
  fn test_update_rejects_blank_title() {
    let mut store = empty_store();
    let task = store.add("keep me", "", Priority::Medium, None).unwrap();

    let result = store.update(
      &task.id,
      TaskPatch {
        title: Some("  ".to_string()),
        ..Default::default()
      },
    );

    assert!(result.is_err());
    assert_eq!(store.tasks()[0].title, "keep me");
  }

  #[test]
  fn test_remove() {
    let mut store = empty_store();
    let a = store.add("a", "", Priority::Medium, None).unwrap();
    store.add("b", "", Priority::Medium, None).unwrap();

    store.remove(&a.id).unwrap();
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].title, "b");

    store.remove("no-such-id").unwrap();
    assert_eq!(store.tasks().len(), 1);
  }

  #[test]
  fn test_filter_projections() {
    let mut store = empty_store();
    let a = store.add("a", "", Priority::Medium, None).unwrap();
    store.add("b", "", Priority::Medium, None).unwrap();
    store.toggle(&a.id).unwrap();

    assert_eq!(store.filter(StatusFilter::All).len(), 2);
    assert_eq!(store.filter(StatusFilter::Active).len(), 1);
    assert_eq!(store.filter(StatusFilter::Active)[0].title, "b");
    assert_eq!(store.filter(StatusFilter::Completed).len(), 1);
    assert_eq!(store.filter(StatusFilter::Completed)[0].title, "a");
  }

  #[test]
  fn test_round_trip_through_slot() {
    let slot = MemorySlot::new();
    let observer = slot.shared();

    let mut store = TaskStore::open(slot);
    store.add("a", "first", Priority::High, Some(1000)).unwrap();
    store.add("b", "", Priority::Low, None).unwrap();
    let id = store.tasks()[0].id.clone();
    store.toggle(&id).unwrap();

    let reloaded = TaskStore::open(observer.shared());
    assert_eq!(reloaded.tasks(), store.tasks());
  }

  #[test]
  fn test_empty_collection_round_trips() {
    let slot = MemorySlot::new();
    let observer = slot.shared();

    let mut store = TaskStore::open(slot);
    let task = store.add("gone soon", "", Priority::Medium, None).unwrap();
    store.remove(&task.id).unwrap();

    let reloaded = TaskStore::open(observer.shared());
    assert!(reloaded.tasks().is_empty());
  }

  #[test]
  fn test_malformed_slot_fails_open() {
    let slot = MemorySlot::new();
    slot.set("{not json");

    let store = TaskStore::open(slot);
    assert!(store.tasks().is_empty());
  }

  #[test]
  fn test_replay_determinism() {
    // The same mutation sequence applied to two empty stores produces the
    // same collection, modulo generated ids and timestamps.
    let apply = |store: &mut TaskStore<MemorySlot>| {
      store.add("one", "", Priority::Low, None).unwrap();
      store.add("two", "x", Priority::High, Some(5)).unwrap();
      let id = store.tasks()[1].id.clone();
      store.toggle(&id).unwrap();
      store
        .update(
          &id,
          TaskPatch {
            description: Some("y".to_string()),
            ..Default::default()
          },
        )
        .unwrap();
      let gone = store.add("three", "", Priority::Medium, None).unwrap();
      store.remove(&gone.id).unwrap();
    };

    let mut a = empty_store();
    let mut b = empty_store();
    apply(&mut a);
    apply(&mut b);

    let shape = |store: &TaskStore<MemorySlot>| -> Vec<(String, String, bool, Priority)> {
      store
        .tasks()
        .iter()
        .map(|t| {
          (
            t.title.clone(),
            t.description.clone(),
            t.completed,
            t.priority,
          )
        })
        .collect()
    };

    assert_eq!(shape(&a), shape(&b));
    assert_eq!(a.tasks().len(), 2);
  }
}
