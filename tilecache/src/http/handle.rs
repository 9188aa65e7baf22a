//! Cancellable in-flight fetches.

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use super::client::{FetchError, HttpFetcher};

/// Runtime identity of one in-flight HTTP fetch.
///
/// Aborting cancels the request; if its completion callback has not run yet,
/// it runs with [`FetchError::Cancelled`]. Dropping the handle aborts it, so
/// releasing the handle is enough to stop the fetch.
#[derive(Debug)]
pub struct FetchHandle {
    token: CancellationToken,
}

impl FetchHandle {
    /// Abort the fetch. Idempotent.
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// Returns true once [`abort`](Self::abort) has been called.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for FetchHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Start a GET for `url` on the current Tokio runtime.
///
/// `on_complete` runs exactly once, on a runtime worker, with the body or the
/// error. Must be called from within a Tokio runtime.
pub fn fetch<F>(fetcher: &dyn HttpFetcher, url: &str, on_complete: F) -> FetchHandle
where
    F: FnOnce(Result<Bytes, FetchError>) + Send + 'static,
{
    let token = CancellationToken::new();
    let cancelled = token.clone();
    let request = fetcher.get(url);

    tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            _ = cancelled.cancelled() => Err(FetchError::Cancelled),
            result = request => result,
        };
        on_complete(result);
    });

    FetchHandle { token }
}
