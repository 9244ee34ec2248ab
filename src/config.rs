use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::gateway::RoutePolicy;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub remote: RemoteConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteConfig {
  /// Base URL the gateway resolves its traffic against. Without it there is
  /// nothing to prime and connectivity probing is disabled.
  pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Version tag embedded in the bucket name. Bumping it is the sole way
  /// to invalidate previously cached entries.
  pub version: String,
  /// Paths primed eagerly during install, relative to the base URL
  pub baseline: Vec<String>,
  /// Path served when a cache-first fetch fails with nothing cached
  pub fallback: String,
  /// Path markers that send a request network-first
  pub api_markers: Vec<String>,
  /// Path suffixes that send a request network-first
  pub data_suffixes: Vec<String>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      version: "v1".to_string(),
      baseline: vec![
        "/".to_string(),
        "/index.html".to_string(),
        "/manifest.json".to_string(),
      ],
      fallback: "/index.html".to_string(),
      api_markers: vec!["/api/".to_string()],
      data_suffixes: vec![".json".to_string()],
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  /// Override for the data directory (default: XDG data dir + "offtask")
  pub data_dir: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./offtask.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/offtask/config.yaml
  ///
  /// No file at all is fine: the app runs on built-in defaults.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("offtask.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("offtask").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// The data directory holding the task slot, cache database and log file.
  pub fn data_dir(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.storage.data_dir {
      return Ok(dir.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("offtask"))
  }

  pub fn tasks_path(&self) -> Result<PathBuf> {
    Ok(self.data_dir()?.join("tasks.json"))
  }

  pub fn cache_db_path(&self) -> Result<PathBuf> {
    Ok(self.data_dir()?.join("cache.db"))
  }

  pub fn log_path(&self) -> Result<PathBuf> {
    Ok(self.data_dir()?.join("offtask.log"))
  }

  /// Bucket name for the configured cache version.
  pub fn cache_name(&self) -> String {
    format!("offtask-cache-{}", self.cache.version)
  }

  pub fn route_policy(&self) -> RoutePolicy {
    RoutePolicy {
      api_markers: self.cache.api_markers.clone(),
      data_suffixes: self.cache.data_suffixes.clone(),
    }
  }

  /// Parsed base URL, if a remote is configured.
  pub fn base_url(&self) -> Result<Option<Url>> {
    match &self.remote.base_url {
      Some(raw) => {
        let url =
          Url::parse(raw).map_err(|e| eyre!("Invalid remote.base_url '{}': {}", raw, e))?;
        Ok(Some(url))
      }
      None => Ok(None),
    }
  }

  /// Baseline paths resolved against the base URL.
  pub fn baseline_urls(&self, base: &Url) -> Result<Vec<Url>> {
    self
      .cache
      .baseline
      .iter()
      .map(|p| {
        base
          .join(p)
          .map_err(|e| eyre!("Invalid baseline path '{}': {}", p, e))
      })
      .collect()
  }

  pub fn fallback_url(&self, base: &Url) -> Result<Url> {
    base
      .join(&self.cache.fallback)
      .map_err(|e| eyre!("Invalid fallback path '{}': {}", self.cache.fallback, e))
  }
}
