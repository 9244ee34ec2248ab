//! Request and response types for the gateway, plus the URL classification
//! policy that picks a serving strategy per request.

use url::Url;

/// HTTP method of an intercepted request. Only GET requests are ever
/// cached; everything else is passed through to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Delete,
}

impl Method {
  pub fn is_get(self) -> bool {
    self == Method::Get
  }
}

/// An outgoing request intercepted by the gateway.
#[derive(Debug, Clone)]
pub struct FetchRequest {
  pub method: Method,
  pub url: Url,
}

impl FetchRequest {
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::Get,
      url,
    }
  }
}

/// Where a response was served from. The presentation layer derives its
/// connectivity indicator from this tag on ordinary traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
  /// Fresh from the network
  Network,
  /// Previously stored copy from the bucket
  Cache,
  /// Network down, served the configured fallback document instead
  Fallback,
  /// Network down and nothing cached: a synthesized 503
  Offline,
}

/// A response handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
  pub served_from: ServedFrom,
}

/// Control signal accepted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
  /// Promote a waiting gateway to active immediately
  SkipWaiting,
}

/// Serving strategy for a GET request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// Bucket first, network on a miss. For assets that change rarely.
  CacheFirst,
  /// Network first, bucket as fallback. For data that changes often.
  NetworkFirst,
}

/// URL classification policy. The matching rule is configuration, not a
/// fixed contract: a path containing any API marker or ending in any data
/// suffix goes network-first, everything else cache-first.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
  pub api_markers: Vec<String>,
  pub data_suffixes: Vec<String>,
}

impl Default for RoutePolicy {
  fn default() -> Self {
    Self {
      api_markers: vec!["/api/".to_string()],
      data_suffixes: vec![".json".to_string()],
    }
  }
}

impl RoutePolicy {
  pub fn classify(&self, url: &Url) -> Strategy {
    let path = url.path();

    let is_data = self.api_markers.iter().any(|m| path.contains(m.as_str()))
      || self.data_suffixes.iter().any(|s| path.ends_with(s.as_str()));

    if is_data {
      Strategy::NetworkFirst
    } else {
      Strategy::CacheFirst
    }
  }
}
