//! Request-interception gateway.
//!
//! A background agent that sits between the UI's outgoing requests and the
//! network. It keeps a single version-tagged bucket of response snapshots:
//! - Install opens the bucket and primes a fixed baseline of resources
//! - Activate deletes every bucket not matching the current version tag
//! - Steady state classifies each GET by URL and serves it cache-first or
//!   network-first, synthesizing a 503 when both paths fail
//! - A skip-waiting control message promotes a waiting gateway immediately

mod bucket;
mod fetcher;
mod machine;
mod request;
mod worker;

pub use bucket::SqliteBucketStore;
pub use fetcher::{HttpFetcher, OfflineFetcher};
pub use machine::{Gateway, GatewaySettings};
pub use request::{FetchRequest, FetchResponse, RoutePolicy, ServedFrom};
pub use worker::{spawn, GatewayHandle};
