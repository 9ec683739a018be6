use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::domain::{CachedItem, ContentItem, ContentPool, QuoteCache, SourceKind};
use crate::provider::refill::PoolRefiller;
use crate::provider::{SourceStrategy, StrategyContext};

/// Cross-day rotating pool, topped up in the background.
pub struct QuoteStrategy {
    ctx: StrategyContext,
    refiller: PoolRefiller,
}

impl QuoteStrategy {
    pub fn new(ctx: StrategyContext, refiller: PoolRefiller) -> Self {
        Self { ctx, refiller }
    }

    fn key(&self) -> String {
        SourceKind::Quote.cache_key()
    }

    /// One foreground fetch that jumps the queue. `None` means the caller
    /// should fall back to normal serving.
    async fn forced_refresh(
        &self,
        cached: &CachedItem<QuoteCache>,
        now_millis: i64,
    ) -> Option<ContentItem> {
        let elapsed = cached.age_millis(now_millis);
        if elapsed < self.ctx.pool.refresh_throttle_millis() {
            info!("Quote refresh throttled ({}s since last write)", elapsed / 1000);
            return None;
        }

        let item = match self.ctx.executor.fetch(SourceKind::Quote).await {
            Ok(item) => item,
            Err(e) => {
                warn!("Forced quote refresh failed, serving from pool: {}", e);
                return None;
            }
        };

        let mut pool = cached.data.clone();
        if !pool.prepend_unique(item.clone(), self.ctx.pool.capacity) {
            debug!("Forced quote refresh returned a pooled quote");
            return None;
        }

        self.ctx
            .storage
            .set(&self.key(), &CachedItem::new(pool, now_millis), false);
        self.refiller.spawn(SourceKind::Quote);
        Some(item)
    }

    fn serve_pool(
        &self,
        mut cached: CachedItem<QuoteCache>,
        force_refresh: bool,
        now_millis: i64,
    ) -> Option<ContentItem> {
        let item = cached.data.current()?.clone();
        let expired = cached.age_millis(now_millis) > self.ctx.pool.cache_duration_millis();

        if !force_refresh {
            cached.data.current_index = cached.data.next_index();
            if expired {
                cached.timestamp = now_millis;
            }
            self.ctx.storage.set(&self.key(), &cached, false);
        }

        if cached.data.items.len() < self.ctx.pool.capacity || expired {
            self.refiller.spawn(SourceKind::Quote);
        }

        Some(item)
    }

    async fn cold_start(&self, now_millis: i64) -> ContentItem {
        match self.ctx.executor.fetch(SourceKind::Quote).await {
            Ok(item) => {
                let pool = QuoteCache::singleton(item.clone());
                self.ctx
                    .storage
                    .set(&self.key(), &CachedItem::new(pool, now_millis), false);
                self.refiller.spawn(SourceKind::Quote);
                item
            }
            Err(e) => {
                warn!("No quote available, using fallback: {}", e);
                SourceKind::Quote.fallback()
            }
        }
    }
}

#[async_trait]
impl SourceStrategy for QuoteStrategy {
    async fn serve(&self, force_refresh: bool, now: DateTime<Local>) -> ContentItem {
        let now_millis = now.timestamp_millis();
        let cached = self
            .ctx
            .storage
            .get::<CachedItem<QuoteCache>>(&self.key(), false);

        if force_refresh {
            if let Some(cached) = &cached {
                if let Some(item) = self.forced_refresh(cached, now_millis).await {
                    return item;
                }
            }
        }

        if let Some(cached) = cached {
            if let Some(item) = self.serve_pool(cached, force_refresh, now_millis) {
                return item;
            }
        }

        self.cold_start(now_millis).await
    }
}
