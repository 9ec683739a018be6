//! Shared fixtures for unit tests: a scripted fetcher and a config that
//! points every endpoint at it.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{LifeProgressError, Result};
use crate::config::{Config, EndpointConfig};
use crate::fetcher::Fetcher;

pub const QUOTE_URL: &str = "http://quote.test/";
pub const HISTORY_URL: &str = "http://history.test/";
pub const ALMANAC_URL: &str = "http://almanac.test/";

pub fn test_config() -> Config {
    Config {
        endpoints: EndpointConfig {
            quote_url: QUOTE_URL.into(),
            history_url: HISTORY_URL.into(),
            almanac_url: ALMANAC_URL.into(),
        },
        ..Config::default()
    }
}

pub enum Reply {
    Body(String),
    Fail(String),
    /// Answer with the body only after the given delay.
    Stall(Duration, String),
}

/// A [`Fetcher`] that replays queued replies per URL and counts calls.
/// An exhausted queue answers with a transport error.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, url: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn push_quote(&self, url: &str, text: &str) {
        self.push(url, Reply::Body(quote_body(text)));
    }

    pub fn push_history(&self, lines: &[&str]) {
        let body = serde_json::json!({ "code": 200, "data": lines }).to_string();
        self.push(HISTORY_URL, Reply::Body(body));
    }

    pub fn push_almanac(&self, lunar_date: &str) {
        let body = serde_json::json!({
            "农历日期": lunar_date,
            "宜": "出行",
            "忌": "动土",
            "干支日期": "丙午年 戊戌月 甲子日",
            "值日星神": "青龙",
        })
        .to_string();
        self.push(ALMANAC_URL, Reply::Body(body));
    }

    /// Queue enough failures to exhaust every retry of one fetch.
    pub fn push_outage(&self, url: &str) {
        for _ in 0..8 {
            self.push(url, Reply::Fail("HTTP 503".into()));
        }
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

pub fn quote_body(text: &str) -> String {
    serde_json::json!({ "hitokoto": text, "from": "测试" }).to_string()
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());

        match reply {
            Some(Reply::Body(body)) => Ok(body.into_bytes()),
            Some(Reply::Fail(message)) => Err(LifeProgressError::Transport(message)),
            Some(Reply::Stall(delay, body)) => {
                tokio::time::sleep(delay).await;
                Ok(body.into_bytes())
            }
            None => Err(LifeProgressError::Transport(format!("no reply scripted for {}", url))),
        }
    }
}
