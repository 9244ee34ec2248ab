//! File-based logging setup.
//!
//! The TUI owns the terminal, so log output goes to a file under the data
//! directory. Level filtering follows `RUST_LOG` (default `info`).

use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber. The returned guard must be held for
/// the lifetime of the process so buffered log lines are flushed on exit.
pub fn init(log_path: &Path) -> Result<WorkerGuard> {
  let dir = log_path
    .parent()
    .ok_or_else(|| eyre!("Log path has no parent directory"))?;
  let file_name = log_path
    .file_name()
    .ok_or_else(|| eyre!("Log path has no file name"))?;

  std::fs::create_dir_all(dir).map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let appender = tracing_appender::rolling::never(dir, file_name);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
