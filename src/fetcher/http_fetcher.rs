use async_trait::async_trait;
use reqwest::Client;

use crate::app::{LifeProgressError, Result};
use crate::config::FetchConfig;
use crate::fetcher::Fetcher;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LifeProgressError::Transport(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }

        let body = response.bytes().await?.to_vec();
        Ok(body)
    }
}
