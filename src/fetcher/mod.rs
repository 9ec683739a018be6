pub mod executor;
pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use executor::FetchExecutor;
pub use http_fetcher::HttpFetcher;

/// One HTTP GET, returning the body of a 2xx response.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
