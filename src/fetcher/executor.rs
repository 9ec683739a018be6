use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::app::{LifeProgressError, Result};
use crate::config::{EndpointConfig, FetchConfig};
use crate::domain::{ContentItem, SourceKind};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;

/// Fetches and normalizes content for a source, retrying with exponential
/// backoff and racing the whole attempt chain against a deadline.
#[derive(Clone)]
pub struct FetchExecutor {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    endpoints: Arc<EndpointConfig>,
    policy: Arc<FetchConfig>,
}

impl FetchExecutor {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        normalizer: Normalizer,
        endpoints: EndpointConfig,
        policy: FetchConfig,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            endpoints: Arc::new(endpoints),
            policy: Arc::new(policy),
        }
    }

    /// Fetch one item for `kind`.
    pub async fn fetch(&self, kind: SourceKind) -> Result<ContentItem> {
        let executor = self.clone();
        self.race(async move {
            executor
                .with_retries(kind, move |normalizer, body| normalizer.normalize(kind, body))
                .await
        })
        .await
    }

    /// Fetch the complete list of today's historical events.
    pub async fn fetch_history_list(&self) -> Result<Vec<ContentItem>> {
        let executor = self.clone();
        self.race(async move {
            executor
                .with_retries(SourceKind::History, |normalizer, body| {
                    normalizer.normalize_history(body)
                })
                .await
        })
        .await
    }

    /// Run `chain` as its own task and wait for it at most the configured
    /// deadline. On expiry the task is left running and its result is
    /// never observed.
    async fn race<T, F>(&self, chain: F) -> Result<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let deadline = self.policy.timeout();
        let handle = tokio::spawn(chain);

        match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(LifeProgressError::Other(format!("fetch task failed: {}", e))),
            Err(_) => {
                warn!("Fetch abandoned after {:?}", deadline);
                Err(LifeProgressError::Timeout(deadline))
            }
        }
    }

    async fn with_retries<T, P>(&self, kind: SourceKind, parse: P) -> Result<T>
    where
        P: Fn(&Normalizer, &[u8]) -> Result<T>,
    {
        let url = self.endpoint(kind)?;
        let mut attempt = 0;

        loop {
            let result = match self.fetcher.fetch(url.as_str()).await {
                Ok(body) => parse(&self.normalizer, &body),
                Err(e) => Err(e),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.policy.retry_count => {
                    let delay = self.policy.backoff(attempt);
                    debug!(
                        "Fetching {} failed (attempt {}/{}), retrying in {:?}: {}",
                        kind,
                        attempt + 1,
                        self.policy.retry_count + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("Fetching {} failed after {} attempts: {}", kind, attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }

    fn endpoint(&self, kind: SourceKind) -> Result<Url> {
        Ok(Url::parse(self.endpoints.url_for(kind))?)
    }
}
