use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::warn;

use crate::domain::{date_key, AlmanacCache, CachedItem, ContentItem, SourceKind};
use crate::provider::{SourceStrategy, StrategyContext};

/// One almanac entry per day; never rotates.
pub struct AlmanacStrategy {
    ctx: StrategyContext,
}

impl AlmanacStrategy {
    pub fn new(ctx: StrategyContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SourceStrategy for AlmanacStrategy {
    async fn serve(&self, _force_refresh: bool, now: DateTime<Local>) -> ContentItem {
        let key = SourceKind::Almanac.cache_key();
        let today = date_key(&now);
        let cached = self.ctx.storage.get::<CachedItem<AlmanacCache>>(&key, false);

        if let Some(cached) = cached.as_ref().filter(|c| c.data.date == today) {
            return cached.data.item.clone();
        }

        match self.ctx.executor.fetch(SourceKind::Almanac).await {
            Ok(item) => {
                let entry = AlmanacCache {
                    date: today,
                    item: item.clone(),
                };
                self.ctx
                    .storage
                    .set(&key, &CachedItem::new(entry, now.timestamp_millis()), false);
                item
            }
            Err(e) => {
                warn!("Failed to fetch almanac: {}", e);
                cached
                    .map(|c| c.data.item)
                    .unwrap_or_else(|| SourceKind::Almanac.fallback())
            }
        }
    }
}
