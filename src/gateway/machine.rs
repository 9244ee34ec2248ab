//! The gateway state machine: install, activate, the steady-state fetch
//! dispatcher, and the skip-waiting control message.

use color_eyre::Result;
use futures::future::join_all;
use tracing::{debug, info, warn};
use url::Url;

use super::bucket::{BucketStore, StoredResponse};
use super::fetcher::{NetworkFetcher, NetworkResponse};
use super::request::{ControlMessage, FetchRequest, FetchResponse, RoutePolicy, ServedFrom, Strategy};

/// Body of the synthesized 503 responses.
pub const OFFLINE_MESSAGE: &str = "no connection";

/// Lifecycle phase of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// Constructed, install not yet run
  New,
  /// Installed (bucket open, baseline primed), waiting for activation
  Waiting,
  /// Serving requests
  Active,
}

/// Static configuration of a gateway instance.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
  /// Version-tagged bucket name, e.g. `offtask-cache-v1`. Changing this tag
  /// is the sole invalidation mechanism: activation deletes every bucket
  /// whose name differs.
  pub cache_name: String,
  /// Resources primed eagerly during install.
  pub baseline: Vec<Url>,
  /// Document served when a cache-first fetch fails with nothing cached
  /// for the requested URL.
  pub fallback: Url,
  pub policy: RoutePolicy,
}

/// The request-interception gateway.
///
/// Generic over its two seams: the bucket store and the network fetcher.
/// Lifecycle transitions take `&mut self` and run to completion before the
/// gateway is shared; steady-state fetches take `&self` and may interleave
/// freely. Two concurrent misses for the same URL may both fetch and both
/// store, which is a benign idempotent overwrite.
pub struct Gateway<B: BucketStore, N: NetworkFetcher> {
  bucket: B,
  network: N,
  settings: GatewaySettings,
  phase: Phase,
}

impl<B: BucketStore, N: NetworkFetcher> Gateway<B, N> {
  pub fn new(bucket: B, network: N, settings: GatewaySettings) -> Self {
    Self {
      bucket,
      network,
      settings,
      phase: Phase::New,
    }
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn is_active(&self) -> bool {
    self.phase == Phase::Active
  }

  /// Install: open the current bucket and prime the baseline resources.
  ///
  /// Priming failures are logged and skipped; the network may be down at
  /// install time, and the gateway must still become installable so a
  /// previously primed bucket keeps working offline.
  pub async fn install(&mut self) {
    info!("Installing gateway for bucket {}", self.settings.cache_name);

    if let Err(e) = self.bucket.open_bucket(&self.settings.cache_name) {
      warn!("Failed to open bucket {}: {}", self.settings.cache_name, e);
    }

    let network = &self.network;
    let fetches = self.settings.baseline.iter().map(|url| {
      let request = FetchRequest::get(url.clone());
      async move { (url, network.fetch(&request).await) }
    });

    let results = join_all(fetches).await;
    for (url, result) in results {
      match result {
        Ok(response) if response.is_ok() => {
          self.store_copy(url, &response);
          debug!("Primed {}", url);
        }
        Ok(response) => {
          warn!("Skipping baseline {}: status {}", url, response.status);
        }
        Err(e) => {
          warn!("Failed to prime {}: {}", url, e);
        }
      }
    }

    self.phase = Phase::Waiting;
  }

  /// Activate: delete every bucket whose name is not the current tag, then
  /// start serving. Eviction is purely name-based.
  pub async fn activate(&mut self) {
    let names = match self.bucket.bucket_names() {
      Ok(names) => names,
      Err(e) => {
        warn!("Failed to enumerate buckets: {}", e);
        Vec::new()
      }
    };

    for name in names {
      if name != self.settings.cache_name {
        info!("Deleting stale bucket {}", name);
        if let Err(e) = self.bucket.delete_bucket(&name) {
          warn!("Failed to delete bucket {}: {}", name, e);
        }
      }
    }

    self.phase = Phase::Active;
  }

  /// Handle a control message. `SkipWaiting` promotes a waiting gateway
  /// immediately; it is a no-op once active.
  pub async fn handle_message(&mut self, message: ControlMessage) {
    match message {
      ControlMessage::SkipWaiting => {
        if self.phase != Phase::Active {
          self.activate().await;
        }
      }
    }
  }

  /// Steady-state dispatcher. Non-GET requests pass through to the network
  /// untouched; GET requests are classified by the route policy and served
  /// by one of the two strategies.
  pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
    if !request.method.is_get() {
      let response = self.network.fetch(request).await?;
      return Ok(tag(response, ServedFrom::Network));
    }

    let response = match self.settings.policy.classify(&request.url) {
      Strategy::CacheFirst => self.cache_first(request).await,
      Strategy::NetworkFirst => self.network_first(request).await,
    };

    Ok(response)
  }

  /// Cache first: a hit is returned immediately without touching the
  /// network. On a miss, fetch and store an ok response. On transport
  /// failure, serve the cached fallback document, else a plain-text 503.
  async fn cache_first(&self, request: &FetchRequest) -> FetchResponse {
    if let Some(stored) = self.lookup(request.url.as_str()) {
      debug!("Cache hit for {}", request.url);
      return from_stored(stored, ServedFrom::Cache);
    }

    match self.network.fetch(request).await {
      Ok(response) => {
        if response.is_ok() {
          self.store_copy(&request.url, &response);
        }
        tag(response, ServedFrom::Network)
      }
      Err(e) => {
        warn!("Fetch failed for {}: {}", request.url, e);
        match self.lookup(self.settings.fallback.as_str()) {
          Some(stored) => from_stored(stored, ServedFrom::Fallback),
          None => FetchResponse {
            status: 503,
            content_type: None,
            body: OFFLINE_MESSAGE.as_bytes().to_vec(),
            served_from: ServedFrom::Offline,
          },
        }
      }
    }
  }

  /// Network first: fetch, storing an ok response. On transport failure,
  /// serve a previously stored copy of the same URL, else a JSON 503.
  async fn network_first(&self, request: &FetchRequest) -> FetchResponse {
    match self.network.fetch(request).await {
      Ok(response) => {
        if response.is_ok() {
          self.store_copy(&request.url, &response);
        }
        tag(response, ServedFrom::Network)
      }
      Err(e) => {
        warn!("Fetch failed for {}, trying cache: {}", request.url, e);
        match self.lookup(request.url.as_str()) {
          Some(stored) => from_stored(stored, ServedFrom::Cache),
          None => FetchResponse {
            status: 503,
            content_type: Some("application/json".to_string()),
            body: serde_json::json!({ "error": OFFLINE_MESSAGE })
              .to_string()
              .into_bytes(),
            served_from: ServedFrom::Offline,
          },
        }
      }
    }
  }

  /// Bucket lookup that degrades read errors to misses. A damaged cache
  /// must never take the request path down.
  fn lookup(&self, url: &str) -> Option<StoredResponse> {
    match self.bucket.get(&self.settings.cache_name, url) {
      Ok(entry) => entry,
      Err(e) => {
        warn!("Cache read failed for {}: {}", url, e);
        None
      }
    }
  }

  /// Store a copy of a network response, logging write failures.
  fn store_copy(&self, url: &Url, response: &NetworkResponse) {
    let stored = StoredResponse {
      status: response.status,
      content_type: response.content_type.clone(),
      body: response.body.clone(),
    };

    if let Err(e) = self.bucket.put(&self.settings.cache_name, url.as_str(), &stored) {
      warn!("Failed to cache {}: {}", url, e);
    }
  }
}

fn tag(response: NetworkResponse, served_from: ServedFrom) -> FetchResponse {
  FetchResponse {
    status: response.status,
    content_type: response.content_type,
    body: response.body,
    served_from,
  }
}

fn from_stored(stored: StoredResponse, served_from: ServedFrom) -> FetchResponse {
  FetchResponse {
    status: stored.status,
    content_type: stored.content_type,
    body: stored.body,
    served_from,
  }
}
