//! Bucket storage trait and SQLite implementation.
//!
//! A bucket is a named key-value store of (URL → response snapshot) pairs.
//! Exactly one bucket is current at a time; stale buckets are deleted by
//! name during activation.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// A stored response snapshot. Bodies are owned bytes, so "cloning before
/// storing" is a plain clone here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

/// Trait for bucket storage backends.
pub trait BucketStore: Send + Sync {
  /// Create the bucket if it does not exist yet.
  fn open_bucket(&self, name: &str) -> Result<()>;

  /// Names of all existing buckets. A bucket exists if it was opened or if
  /// any entry was stored under its name.
  fn bucket_names(&self) -> Result<Vec<String>>;

  /// Delete a bucket and everything in it.
  fn delete_bucket(&self, name: &str) -> Result<()>;

  /// Look up a stored response by URL.
  fn get(&self, bucket: &str, url: &str) -> Result<Option<StoredResponse>>;

  /// Store a response snapshot, overwriting any previous entry for the URL.
  fn put(&self, bucket: &str, url: &str, response: &StoredResponse) -> Result<()>;
}

impl<T: BucketStore + ?Sized> BucketStore for std::sync::Arc<T> {
  fn open_bucket(&self, name: &str) -> Result<()> {
    (**self).open_bucket(name)
  }

  fn bucket_names(&self) -> Result<Vec<String>> {
    (**self).bucket_names()
  }

  fn delete_bucket(&self, name: &str) -> Result<()> {
    (**self).delete_bucket(name)
  }

  fn get(&self, bucket: &str, url: &str) -> Result<Option<StoredResponse>> {
    (**self).get(bucket, url)
  }

  fn put(&self, bucket: &str, url: &str, response: &StoredResponse) -> Result<()> {
    (**self).put(bucket, url, response)
  }
}

/// SQLite-backed bucket store. All buckets share one database file; the
/// bucket name is part of the primary key.
pub struct SqliteBucketStore {
  conn: Mutex<Connection>,
}

/// Schema for the bucket tables.
const BUCKET_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS buckets (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS entries (
    bucket TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (bucket, url)
);
"#;

impl SqliteBucketStore {
  /// Open (creating if needed) the bucket database at the given path.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// In-memory database, used by the SQLite tests.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory db: {}", e))?;
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(BUCKET_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

impl BucketStore for SqliteBucketStore {
  fn open_bucket(&self, name: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR IGNORE INTO buckets (name) VALUES (?)",
        params![name],
      )
      .map_err(|e| eyre!("Failed to open bucket {}: {}", name, e))?;

    Ok(())
  }

  fn bucket_names(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    // Union with the entry rows so entries stored under a bucket that was
    // never opened still count as a bucket and get swept at activation.
    let mut stmt = conn
      .prepare("SELECT name FROM buckets UNION SELECT bucket FROM entries ORDER BY name")
      .map_err(|e| eyre!("Failed to prepare bucket query: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list buckets: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(names)
  }

  fn delete_bucket(&self, name: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM entries WHERE bucket = ?", params![name])
      .map_err(|e| eyre!("Failed to delete bucket entries: {}", e))?;
    conn
      .execute("DELETE FROM buckets WHERE name = ?", params![name])
      .map_err(|e| eyre!("Failed to delete bucket {}: {}", name, e))?;

    Ok(())
  }

  fn get(&self, bucket: &str, url: &str) -> Result<Option<StoredResponse>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT status, content_type, body FROM entries WHERE bucket = ? AND url = ?")
      .map_err(|e| eyre!("Failed to prepare entry query: {}", e))?;

    let result = stmt
      .query_row(params![bucket, url], |row| {
        Ok(StoredResponse {
          status: row.get(0)?,
          content_type: row.get(1)?,
          body: row.get(2)?,
        })
      })
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry: {}", e))?;

    Ok(result)
  }

  fn put(&self, bucket: &str, url: &str, response: &StoredResponse) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO entries (bucket, url, status, content_type, body, stored_at)
         VALUES (?, ?, ?, ?, ?, datetime('now'))",
        params![
          bucket,
          url,
          response.status,
          response.content_type,
          response.body
        ],
      )
      .map_err(|e| eyre!("Failed to store cache entry: {}", e))?;

    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn response(body: &str) -> StoredResponse {
    StoredResponse {
      status: 200,
      content_type: Some("text/html".to_string()),
      body: body.as_bytes().to_vec(),
    }
  }

  #[test]
  fn test_open_bucket_is_idempotent() {
    let store = SqliteBucketStore::open_in_memory().unwrap();
    store.open_bucket("offtask-cache-v1").unwrap();
    store.open_bucket("offtask-cache-v1").unwrap();

    assert_eq!(store.bucket_names().unwrap(), vec!["offtask-cache-v1"]);
  }

  #[test]
  fn test_put_get_round_trip() {
    let store = SqliteBucketStore::open_in_memory().unwrap();
    store.open_bucket("v1").unwrap();

    let stored = response("<html>");
    store.put("v1", "https://example.com/", &stored).unwrap();

    let loaded = store.get("v1", "https://example.com/").unwrap();
    assert_eq!(loaded, Some(stored));
  }

  #[test]
  fn test_get_missing_is_none() {
    let store = SqliteBucketStore::open_in_memory().unwrap();
    assert_eq!(store.get("v1", "https://example.com/nope").unwrap(), None);
  }

  #[test]
  fn test_put_overwrites() {
    let store = SqliteBucketStore::open_in_memory().unwrap();
    store.put("v1", "https://example.com/", &response("old")).unwrap();
    store.put("v1", "https://example.com/", &response("new")).unwrap();

    let loaded = store.get("v1", "https://example.com/").unwrap().unwrap();
    assert_eq!(loaded.body, b"new");
  }

  #[test]
  fn test_buckets_are_isolated() {
    let store = SqliteBucketStore::open_in_memory().unwrap();
    store.put("v1", "https://example.com/", &response("a")).unwrap();

    assert_eq!(store.get("v2", "https://example.com/").unwrap(), None);
  }

  #[test]
  fn test_bucket_names_include_buckets_never_opened() {
    let store = SqliteBucketStore::open_in_memory().unwrap();
    store.open_bucket("v2").unwrap();
    // Entries stored without an open_bucket call
    store.put("v1", "https://example.com/", &response("a")).unwrap();

    assert_eq!(store.bucket_names().unwrap(), vec!["v1", "v2"]);
  }

  #[test]
  fn test_delete_bucket_removes_entries() {
    let store = SqliteBucketStore::open_in_memory().unwrap();
    store.open_bucket("v1").unwrap();
    store.open_bucket("v2").unwrap();
    store.put("v1", "https://example.com/", &response("a")).unwrap();

    store.delete_bucket("v1").unwrap();

    assert_eq!(store.bucket_names().unwrap(), vec!["v2"]);
    assert_eq!(store.get("v1", "https://example.com/").unwrap(), None);
  }

  #[test]
  fn test_store_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    {
      let store = SqliteBucketStore::open(&path).unwrap();
      store.open_bucket("v1").unwrap();
      store.put("v1", "https://example.com/", &response("kept")).unwrap();
    }

    let store = SqliteBucketStore::open(&path).unwrap();
    let loaded = store.get("v1", "https://example.com/").unwrap().unwrap();
    assert_eq!(loaded.body, b"kept");
  }
}
