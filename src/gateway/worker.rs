//! Background driver for the gateway state machine.
//!
//! `spawn` moves the gateway onto a tokio task and returns a cheap handle.
//! The driver runs install, requests skip-waiting on itself (so under
//! normal operation activation does not wait for an external message), and
//! then serves fetch commands, each on its own task so concurrent requests
//! interleave at await points.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::bucket::BucketStore;
use super::fetcher::NetworkFetcher;
use super::machine::Gateway;
use super::request::{ControlMessage, FetchRequest, FetchResponse};

enum GatewayCommand {
  Fetch {
    request: FetchRequest,
    reply: oneshot::Sender<Result<FetchResponse>>,
  },
  Message(ControlMessage),
}

/// Handle onto a running gateway. Cloning creates another sender onto the
/// same driver; dropping every handle shuts the driver down.
#[derive(Clone)]
pub struct GatewayHandle {
  tx: mpsc::UnboundedSender<GatewayCommand>,
}

impl GatewayHandle {
  /// Route a request through the gateway and wait for the response.
  pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
    let (reply, rx) = oneshot::channel();

    self
      .tx
      .send(GatewayCommand::Fetch { request, reply })
      .map_err(|_| eyre!("Gateway is gone"))?;

    rx.await.map_err(|_| eyre!("Gateway dropped the request"))?
  }

  /// Fire-and-forget skip-waiting signal, mirroring the one-way control
  /// message of the foreground application.
  pub fn skip_waiting(&self) {
    let _ = self.tx.send(GatewayCommand::Message(ControlMessage::SkipWaiting));
  }
}

/// Spawn the gateway onto a background task.
pub fn spawn<B, N>(gateway: Gateway<B, N>) -> GatewayHandle
where
  B: BucketStore + 'static,
  N: NetworkFetcher + 'static,
{
  let (tx, mut rx) = mpsc::unbounded_channel();
  let handle = GatewayHandle { tx };
  let driver = handle.clone();

  tokio::spawn(async move {
    let mut gateway = gateway;
    gateway.install().await;
    driver.skip_waiting();

    // Commands that arrive while waiting stay queued: fetches are held back
    // until activation, control messages drive the activation itself.
    let mut pending = Vec::new();
    while !gateway.is_active() {
      match rx.recv().await {
        Some(GatewayCommand::Fetch { request, reply }) => pending.push((request, reply)),
        Some(GatewayCommand::Message(message)) => gateway.handle_message(message).await,
        None => return,
      }
    }

    let gateway = Arc::new(gateway);

    for (request, reply) in pending {
      serve(Arc::clone(&gateway), request, reply);
    }

    while let Some(command) = rx.recv().await {
      match command {
        GatewayCommand::Fetch { request, reply } => {
          serve(Arc::clone(&gateway), request, reply);
        }
        // Already active, nothing to promote
        GatewayCommand::Message(_) => {}
      }
    }
  });

  handle
}

fn serve<B, N>(
  gateway: Arc<Gateway<B, N>>,
  request: FetchRequest,
  reply: oneshot::Sender<Result<FetchResponse>>,
) where
  B: BucketStore + 'static,
  N: NetworkFetcher + 'static,
{
  tokio::spawn(async move {
    let response = gateway.handle_fetch(&request).await;
    let _ = reply.send(response);
  });
}

#[cfg(test)]
mod tests {
  use super::super::bucket::testing::MemoryBucketStore;
  use super::super::fetcher::testing::StubFetcher;
  use super::super::machine::GatewaySettings;
  use super::super::request::{RoutePolicy, ServedFrom};
  use super::*;
  use url::Url;

  fn settings() -> GatewaySettings {
    GatewaySettings {
      cache_name: "offtask-cache-v1".to_string(),
      baseline: vec![Url::parse("https://example.com/index.html").unwrap()],
      fallback: Url::parse("https://example.com/index.html").unwrap(),
      policy: RoutePolicy::default(),
    }
  }

  fn get(url: &str) -> FetchRequest {
    FetchRequest::get(Url::parse(url).unwrap())
  }

  #[tokio::test]
  async fn test_fetches_are_served_after_auto_activation() {
    let bucket = Arc::new(MemoryBucketStore::new());
    let network = Arc::new(StubFetcher::new());
    network.respond("https://example.com/index.html", 200, Some("text/html"), b"hi");
    network.respond("https://example.com/api/tasks", 200, None, b"[]");

    let handle = spawn(Gateway::new(Arc::clone(&bucket), Arc::clone(&network), settings()));

    // Issued immediately; the driver may still be installing, so this
    // exercises the pending queue as well as the steady state.
    let response = handle.fetch(get("https://example.com/api/tasks")).await.unwrap();
    assert_eq!(response.served_from, ServedFrom::Network);
    assert_eq!(response.body, b"[]");
  }

  #[tokio::test]
  async fn test_install_then_offline_serves_primed_baseline() {
    let bucket = Arc::new(MemoryBucketStore::new());
    let network = Arc::new(StubFetcher::new());
    network.respond("https://example.com/index.html", 200, Some("text/html"), b"hi");

    let handle = spawn(Gateway::new(Arc::clone(&bucket), Arc::clone(&network), settings()));

    // Warm request goes through; afterwards the network dies.
    handle.fetch(get("https://example.com/index.html")).await.unwrap();
    network.set_failing(true);

    let response = handle.fetch(get("https://example.com/index.html")).await.unwrap();
    assert_eq!(response.served_from, ServedFrom::Cache);
    assert_eq!(response.body, b"hi");
  }

  #[tokio::test]
  async fn test_concurrent_fetches() {
    let bucket = Arc::new(MemoryBucketStore::new());
    let network = Arc::new(StubFetcher::new());
    network.respond("https://example.com/index.html", 200, Some("text/html"), b"hi");
    network.respond("https://example.com/a.json", 200, None, b"1");
    network.respond("https://example.com/b.json", 200, None, b"2");

    let handle = spawn(Gateway::new(bucket, network, settings()));

    let (a, b) = tokio::join!(
      handle.fetch(get("https://example.com/a.json")),
      handle.fetch(get("https://example.com/b.json")),
    );

    assert_eq!(a.unwrap().body, b"1");
    assert_eq!(b.unwrap().body, b"2");
  }

  #[tokio::test]
  async fn test_extra_skip_waiting_is_harmless() {
    let network = Arc::new(StubFetcher::new());
    network.respond("https://example.com/index.html", 200, Some("text/html"), b"hi");
    network.respond("https://example.com/a.json", 200, None, b"1");

    let handle = spawn(Gateway::new(MemoryBucketStore::new(), network, settings()));

    // The driver already requested skip-waiting on itself; an external one
    // must be accepted in any phase without disturbing traffic.
    handle.skip_waiting();
    let response = handle.fetch(get("https://example.com/a.json")).await.unwrap();
    handle.skip_waiting();

    assert_eq!(response.body, b"1");
  }
}
