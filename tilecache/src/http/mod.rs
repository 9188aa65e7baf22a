//! HTTP tile fetching.
//!
//! [`HttpFetcher`] abstracts a single GET so the coordinator can be driven by
//! a mock in tests; [`ReqwestFetcher`] is the real client. [`fetch`] starts one
//! request in the background and returns a [`FetchHandle`] that can abort it.
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilecache::http::{fetch, HttpConfig, HttpFetcher, ReqwestFetcher};
//!
//! let client: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(&HttpConfig::default())?);
//! let handle = fetch(client.as_ref(), "https://tile.openstreetmap.org/0/0/0.png", |result| {
//!     println!("{:?}", result.map(|body| body.len()));
//! });
//! handle.abort();
//! ```

mod client;
mod handle;

pub use client::{
    FetchError, HttpConfig, HttpFetcher, ReqwestFetcher, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_USER_AGENT,
};
pub use handle::{fetch, FetchHandle};

#[cfg(test)]
pub use client::tests::{MockHttpFetcher, MockResponse};
