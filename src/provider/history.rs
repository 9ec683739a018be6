use async_trait::async_trait;
use chrono::{DateTime, Local};
use rand::seq::IndexedRandom;
use tracing::warn;

use crate::domain::{date_key, CachedItem, ContentItem, ContentPool, HistoryCache, SourceKind};
use crate::provider::{SourceStrategy, StrategyContext};

/// "On this day" events, fetched as a whole list once per local date.
pub struct HistoryStrategy {
    ctx: StrategyContext,
}

impl HistoryStrategy {
    pub fn new(ctx: StrategyContext) -> Self {
        Self { ctx }
    }

    fn key(&self) -> String {
        SourceKind::History.cache_key()
    }
}

#[async_trait]
impl SourceStrategy for HistoryStrategy {
    async fn serve(&self, force_refresh: bool, now: DateTime<Local>) -> ContentItem {
        let today = date_key(&now);
        let cached = self
            .ctx
            .storage
            .get::<CachedItem<HistoryCache>>(&self.key(), false);

        if let Some(cached) = cached.as_ref().filter(|c| c.data.date == today) {
            if let Some(item) = cached.data.current().cloned() {
                // A manual refresh re-shows the current event.
                if !force_refresh {
                    let mut next = cached.clone();
                    next.data.current_index = cached.data.next_index();
                    self.ctx.storage.set(&self.key(), &next, false);
                }
                return item;
            }
        }

        match self.ctx.executor.fetch_history_list().await {
            Ok(items) if !items.is_empty() => {
                let day = HistoryCache::fresh(today, items);
                let first = day.items[0].clone();
                self.ctx.storage.set(
                    &self.key(),
                    &CachedItem::new(day, now.timestamp_millis()),
                    false,
                );
                first
            }
            Ok(_) => {
                warn!("History endpoint returned no events");
                stale_or_fallback(cached.as_ref())
            }
            Err(e) => {
                warn!("Failed to fetch history list: {}", e);
                stale_or_fallback(cached.as_ref())
            }
        }
    }
}

/// A random event from an outdated list, so a stale day is less obvious.
fn stale_or_fallback(cached: Option<&CachedItem<HistoryCache>>) -> ContentItem {
    cached
        .and_then(|c| c.data.items.choose(&mut rand::rng()).cloned())
        .unwrap_or_else(|| SourceKind::History.fallback())
}
