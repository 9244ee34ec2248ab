mod app;
mod config;
mod event;
mod gateway;
mod logging;
mod store;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

use gateway::{Gateway, GatewaySettings, HttpFetcher, OfflineFetcher, SqliteBucketStore};
use store::{FileSlot, TaskStore};

#[derive(Parser, Debug)]
#[command(name = "offtask")]
#[command(about = "An offline-first task manager for the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/offtask/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Run with networking disabled (everything served from cache)
  #[arg(long)]
  offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(&config.log_path()?)?;

  // Task store hydrates from the slot; a damaged slot starts empty
  let store = TaskStore::open(FileSlot::new(config.tasks_path()?));

  // Spawn the gateway if a remote is configured
  let gateway = match config.base_url()? {
    Some(base) => {
      let bucket = SqliteBucketStore::open(&config.cache_db_path()?)?;
      let settings = GatewaySettings {
        cache_name: config.cache_name(),
        baseline: config.baseline_urls(&base)?,
        fallback: config.fallback_url(&base)?,
        policy: config.route_policy(),
      };

      let handle = if args.offline {
        gateway::spawn(Gateway::new(bucket, OfflineFetcher, settings))
      } else {
        gateway::spawn(Gateway::new(bucket, HttpFetcher::new()?, settings))
      };

      Some((handle, base))
    }
    None => None,
  };

  // Initialize and run the app
  let mut app = app::App::new(store, gateway)?;
  app.run().await?;

  Ok(())
}
