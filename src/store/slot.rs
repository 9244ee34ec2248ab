//! The persistent slot: a single string value the task collection is
//! mirrored into after every mutation.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

/// Trait for persistent slot backends.
pub trait StorageSlot {
  /// Read the slot contents. `None` means the slot has never been written.
  fn read(&self) -> Result<Option<String>>;

  /// Overwrite the slot wholesale.
  fn write(&self, contents: &str) -> Result<()>;
}

/// File-backed slot under the data directory.
pub struct FileSlot {
  path: PathBuf,
}

impl FileSlot {
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }
}

impl StorageSlot for FileSlot {
  fn read(&self) -> Result<Option<String>> {
    if !self.path.exists() {
      return Ok(None);
    }

    std::fs::read_to_string(&self.path)
      .map(Some)
      .map_err(|e| eyre!("Failed to read {}: {}", self.path.display(), e))
  }

  fn write(&self, contents: &str) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create data directory: {}", e))?;
    }

    std::fs::write(&self.path, contents)
      .map_err(|e| eyre!("Failed to write {}: {}", self.path.display(), e))
  }
}

/// In-memory slot for tests.
#[cfg(test)]
pub struct MemorySlot {
  cell: std::sync::Arc<std::sync::Mutex<Option<String>>>,
}

#[cfg(test)]
impl MemorySlot {
  pub fn new() -> Self {
    Self {
      cell: std::sync::Arc::new(std::sync::Mutex::new(None)),
    }
  }

  /// Another handle onto the same cell, for observing writes from outside.
  pub fn shared(&self) -> Self {
    Self {
      cell: std::sync::Arc::clone(&self.cell),
    }
  }

  pub fn contents(&self) -> Option<String> {
    self.cell.lock().unwrap().clone()
  }

  pub fn set(&self, contents: &str) {
    *self.cell.lock().unwrap() = Some(contents.to_string());
  }
}

#[cfg(test)]
impl StorageSlot for MemorySlot {
  fn read(&self) -> Result<Option<String>> {
    Ok(self.cell.lock().unwrap().clone())
  }

  fn write(&self, contents: &str) -> Result<()> {
    *self.cell.lock().unwrap() = Some(contents.to_string());
    Ok(())
  }
}
