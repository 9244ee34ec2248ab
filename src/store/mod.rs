//! Local task persistence.
//!
//! The collection lives in memory and is mirrored wholesale into a single
//! persistent slot (a JSON document) after every mutation. Hydration happens
//! once at startup and fails open: a damaged slot yields an empty collection.

pub mod slot;
mod task;
mod tasks;

pub use slot::{FileSlot, StorageSlot};
pub use task::{sort_for_display, Priority, StatusFilter, Task, TaskPatch};
pub use tasks::TaskStore;
