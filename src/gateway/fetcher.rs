//! Network fetching trait and the reqwest-backed implementation.

use color_eyre::{eyre::eyre, Result};
use std::future::Future;

use super::request::{FetchRequest, Method};

/// A raw response from the network, before the gateway tags it.
#[derive(Debug, Clone)]
pub struct NetworkResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl NetworkResponse {
  /// 2xx statuses are cacheable; everything else is returned uncached.
  pub fn is_ok(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Trait for the network seam. An `Err` means transport failure (offline,
/// DNS, connection refused); an HTTP error status is still an `Ok` response.
pub trait NetworkFetcher: Send + Sync {
  fn fetch(&self, request: &FetchRequest)
    -> impl Future<Output = Result<NetworkResponse>> + Send;
}

impl<T: NetworkFetcher + ?Sized> NetworkFetcher for std::sync::Arc<T> {
  fn fetch(
    &self,
    request: &FetchRequest,
  ) -> impl Future<Output = Result<NetworkResponse>> + Send {
    (**self).fetch(request)
  }
}

/// reqwest-backed fetcher.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

impl From<Method> for reqwest::Method {
  fn from(method: Method) -> Self {
    match method {
      Method::Get => reqwest::Method::GET,
      Method::Head => reqwest::Method::HEAD,
      Method::Post => reqwest::Method::POST,
      Method::Put => reqwest::Method::PUT,
      Method::Delete => reqwest::Method::DELETE,
    }
  }
}

impl NetworkFetcher for HttpFetcher {
  fn fetch(
    &self,
    request: &FetchRequest,
  ) -> impl Future<Output = Result<NetworkResponse>> + Send {
    let client = self.client.clone();
    let method: reqwest::Method = request.method.into();
    let url = request.url.clone();

    async move {
      let response = client
        .request(method, url.clone())
        .send()
        .await
        .map_err(|e| eyre!("Fetch failed for {}: {}", url, e))?;

      let status = response.status().as_u16();
      let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
      let body = response
        .bytes()
        .await
        .map_err(|e| eyre!("Failed to read body from {}: {}", url, e))?
        .to_vec();

      Ok(NetworkResponse {
        status,
        content_type,
        body,
      })
    }
  }
}

/// Fetcher that refuses every request. Backs the `--offline` flag, which
/// forces all traffic down the cache and fallback paths.
pub struct OfflineFetcher;

impl NetworkFetcher for OfflineFetcher {
  fn fetch(
    &self,
    request: &FetchRequest,
  ) -> impl Future<Output = Result<NetworkResponse>> + Send {
    let url = request.url.clone();
    async move { Err(eyre!("Offline mode: refusing to fetch {}", url)) }
  }
}
