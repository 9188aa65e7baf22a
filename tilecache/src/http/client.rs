//! HTTP client abstraction for testability

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::trace;

/// Default User-Agent string for tile requests.
///
/// Mimics a legacy desktop browser; some community tile servers reject
/// unknown agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows; U; MSIE 6.0; Windows NT 5.1; SV1; .NET CLR 2.0.50727)";

/// Default upper bound on a tile response body (4 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Errors that can occur while fetching a tile.
///
/// [`FetchError::Cancelled`] is the only variant the coordinator treats
/// silently; every other variant triggers the cache/placeholder fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request was aborted through its handle.
    #[error("Request cancelled")]
    Cancelled,

    /// Server answered with a status of 400 or above.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// DNS, connect, TLS or body transfer failure.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The body exceeded the configured maximum.
    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Returns true for an aborted request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// HTTP settings for tile requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpConfig {
    /// Value of the `User-Agent` header.
    pub user_agent: String,

    /// Verify the server's TLS certificate chain and hostname.
    ///
    /// Off by default so self-signed and misconfigured tile endpoints keep
    /// working. Turn it on for deployments that must not trust such servers.
    pub verify_tls: bool,

    /// Responses with a larger body are rejected.
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            verify_tls: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl HttpConfig {
    /// Set the `User-Agent` header value.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    /// Set the maximum accepted body size.
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Trait for issuing a single tile GET.
///
/// The returned future owns everything it needs, so it can be spawned and
/// dropped independently of the fetcher. Dropping it aborts the request.
pub trait HttpFetcher: Send + Sync {
    /// Fetch `url` and return the full response body.
    fn get(&self, url: &str) -> BoxFuture<'static, Result<Bytes, FetchError>>;
}

/// Real HTTP client implementation using reqwest.
///
/// No timeout or retry is applied; cancellation is the caller's tool for
/// giving up on a request.
///
/// Requests go out as plain GETs over reqwest's connection pool. reqwest does
/// not pipeline HTTP/1.1 requests and keeps no response cache, so the tile
/// store is the only cache in play.
///
/// TLS certificates are not verified unless [`HttpConfig::verify_tls`] is set,
/// so self-signed tile servers work out of the box.
#[derive(Clone, Debug)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl ReqwestFetcher {
    /// Creates a fetcher from the given settings.
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

impl HttpFetcher for ReqwestFetcher {
    fn get(&self, url: &str) -> BoxFuture<'static, Result<Bytes, FetchError>> {
        let client = self.client.clone();
        let limit = self.max_body_bytes;
        let url = url.to_string();

        Box::pin(async move {
            let mut response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            let declared = response.content_length().unwrap_or(0);
            if declared > limit as u64 {
                return Err(FetchError::BodyTooLarge { limit });
            }

            let mut body = BytesMut::with_capacity(declared as usize);
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| FetchError::Transport(format!("Failed to read response: {}", e)))?
            {
                if body.len() + chunk.len() > limit {
                    return Err(FetchError::BodyTooLarge { limit });
                }
                body.extend_from_slice(&chunk);
            }

            trace!(url = %url, bytes = body.len(), "Tile response received");
            Ok(body.freeze())
        })
    }
}
