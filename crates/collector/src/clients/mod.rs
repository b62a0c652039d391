//! Page fetching: the fetcher seam and the policy every fetch runs under.

pub mod chessgames;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use pgn_core::RawGamePayload;
use tracing::warn;

use crate::error::ScrapeError;

pub use chessgames::ChessgamesClient;

/// Resolves URLs to game payloads and listing markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a game page and pull out its PGN and annotation payload.
    async fn fetch_game(&self, url: &str) -> Result<RawGamePayload, ScrapeError>;

    /// Fetch the raw markup of a listing page.
    async fn fetch_listing_page(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Timeout, retry and politeness delay applied to every fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    /// Extra attempts after a transient failure. 0 disables retrying.
    pub retries: u32,
    /// Sleep before each request.
    pub request_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 1,
            request_delay: Duration::from_millis(100),
        }
    }
}

impl FetchPolicy {
    /// Run `fetch` under the policy. Parse failures are returned at once;
    /// network failures and timeouts are retried up to `retries` times.
    pub async fn run<T, F, Fut>(&self, url: &str, mut fetch: F) -> Result<T, ScrapeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScrapeError>>,
    {
        let mut attempt = 0;
        loop {
            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            let outcome = match tokio::time::timeout(self.timeout, fetch()).await {
                Ok(result) => result,
                Err(_) => Err(ScrapeError::Timeout(self.timeout)),
            };

            match outcome {
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    warn!(url, attempt, error = %e, "Fetch failed, retrying");
                }
                other => return other,
            }
        }
    }
}
