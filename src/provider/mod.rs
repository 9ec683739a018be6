//! Decides what content to show right now for the selected source.
//!
//! ```text
//! ContentProvider → SourceStrategy → {Storage read, FetchExecutor, Storage write}
//! ```
//!
//! Every activation starts from whatever the store holds; nothing is kept
//! in memory between activations except the in-flight refill set.

pub mod almanac;
pub mod history;
pub mod quote;
pub mod refill;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::config::{Config, PoolConfig};
use crate::domain::{ContentItem, SourceKind};
use crate::fetcher::FetchExecutor;
use crate::store::Storage;

pub use almanac::AlmanacStrategy;
pub use history::HistoryStrategy;
pub use quote::QuoteStrategy;
pub use refill::{PoolRefiller, RefillGuard, RefillPermit};

/// Store key holding the selected [`SourceKind`].
pub const CONTENT_SOURCE_KEY: &str = "content_source";

/// What every strategy reads from and writes to.
#[derive(Clone)]
pub struct StrategyContext {
    pub storage: Storage,
    pub executor: FetchExecutor,
    pub pool: Arc<PoolConfig>,
}

/// Serves one source from its cache, the network, or a fallback.
#[async_trait]
pub trait SourceStrategy: Send + Sync {
    /// Always produces an item; failures degrade to stale data or the
    /// source's fallback.
    async fn serve(&self, force_refresh: bool, now: DateTime<Local>) -> ContentItem;
}

pub struct ContentProvider {
    storage: Storage,
    default_source: SourceKind,
    refiller: PoolRefiller,
    quote: QuoteStrategy,
    history: HistoryStrategy,
    almanac: AlmanacStrategy,
}

impl ContentProvider {
    pub fn new(storage: Storage, executor: FetchExecutor, config: &Config) -> Self {
        Self::with_guard(storage, executor, config, RefillGuard::new())
    }

    pub fn with_guard(
        storage: Storage,
        executor: FetchExecutor,
        config: &Config,
        guard: Arc<RefillGuard>,
    ) -> Self {
        let ctx = StrategyContext {
            storage: storage.clone(),
            executor: executor.clone(),
            pool: Arc::new(config.pool.clone()),
        };
        let refiller = PoolRefiller::new(
            storage.clone(),
            executor,
            guard,
            config.pool.capacity,
            config.pool.refill_pause(),
        );

        Self {
            storage,
            default_source: config.content.default_source,
            quote: QuoteStrategy::new(ctx.clone(), refiller.clone()),
            history: HistoryStrategy::new(ctx.clone()),
            almanac: AlmanacStrategy::new(ctx),
            refiller,
        }
    }

    pub fn refiller(&self) -> &PoolRefiller {
        &self.refiller
    }

    pub fn strategy(&self, kind: SourceKind) -> &dyn SourceStrategy {
        match kind {
            SourceKind::Quote => &self.quote,
            SourceKind::History => &self.history,
            SourceKind::Almanac => &self.almanac,
        }
    }

    /// The persisted source selection, or the configured default.
    pub fn content_source(&self) -> SourceKind {
        self.storage
            .get::<SourceKind>(CONTENT_SOURCE_KEY, false)
            .unwrap_or(self.default_source)
    }

    pub fn set_content_source(&self, kind: SourceKind) -> bool {
        self.storage.set(CONTENT_SOURCE_KEY, &kind, false)
    }

    pub async fn get_dynamic_content(&self, force_refresh: bool) -> ContentItem {
        self.get_dynamic_content_at(force_refresh, Local::now()).await
    }

    pub async fn get_dynamic_content_at(
        &self,
        force_refresh: bool,
        now: DateTime<Local>,
    ) -> ContentItem {
        let kind = self.content_source();
        debug!("Serving {} content (force_refresh={})", kind, force_refresh);

        let mut item = self.strategy(kind).serve(force_refresh, now).await;
        if item.icon.is_none() {
            item.icon = Some(kind.default_icon().to_string());
        }
        item
    }

    /// Raw JSON of a source's cache record.
    pub fn cache_record(&self, kind: SourceKind) -> Option<String> {
        self.storage.get_raw(&kind.cache_key(), false)
    }

    pub fn clear_cache(&self, kind: SourceKind) -> bool {
        let removed = self.storage.remove(&kind.cache_key(), false);
        if !removed {
            warn!("No cache to clear for {}", kind);
        }
        removed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::app::{LifeProgressError, Result};
    use crate::domain::{CachedItem, QuoteCache};
    use crate::normalizer::Normalizer;
    use crate::store::{KvStore, Scope, SqliteStore};
    use crate::testing::{test_config, ScriptedFetcher, ALMANAC_URL, QUOTE_URL};

    pub(crate) struct Harness {
        pub fetcher: Arc<ScriptedFetcher>,
        pub storage: Storage,
        pub refiller: PoolRefiller,
        pub quote: QuoteStrategy,
        pub history: HistoryStrategy,
        pub almanac: AlmanacStrategy,
        pub provider: ContentProvider,
    }

    pub(crate) fn harness() -> Harness {
        harness_with(Arc::new(SqliteStore::in_memory().unwrap()))
    }

    fn harness_with(backend: Arc<dyn KvStore + Send + Sync>) -> Harness {
        let config = test_config();
        let fetcher = ScriptedFetcher::new();
        let storage = Storage::new(backend);
        let executor = FetchExecutor::new(
            fetcher.clone(),
            Normalizer::new(),
            config.endpoints.clone(),
            config.fetch.clone(),
        );
        let provider =
            ContentProvider::with_guard(storage.clone(), executor.clone(), &config, RefillGuard::new());
        let refiller = provider.refiller().clone();
        let ctx = StrategyContext {
            storage: storage.clone(),
            executor,
            pool: Arc::new(config.pool.clone()),
        };

        Harness {
            fetcher,
            storage,
            quote: QuoteStrategy::new(ctx.clone(), refiller.clone()),
            history: HistoryStrategy::new(ctx.clone()),
            almanac: AlmanacStrategy::new(ctx),
            refiller,
            provider,
        }
    }

    /// Seed a quote pool of `len` items named `pooled {i}`.
    pub(crate) fn seed_quotes(h: &Harness, len: usize, current_index: usize, timestamp: i64) {
        let pool = QuoteCache {
            items: (0..len)
                .map(|i| ContentItem::new("每日一言", format!("pooled {}", i), "测试"))
                .collect(),
            current_index,
        };
        assert!(h.storage.set(
            &SourceKind::Quote.cache_key(),
            &CachedItem::new(pool, timestamp),
            false
        ));
    }

    pub(crate) fn quote_pool(h: &Harness) -> QuoteCache {
        h.storage
            .get::<CachedItem<QuoteCache>>(&SourceKind::Quote.cache_key(), false)
            .expect("quote pool persisted")
            .data
    }

    /// Wait for any background refill to finish.
    pub(crate) async fn settle(h: &Harness) {
        while h.refiller.is_filling(SourceKind::Quote) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get_raw(&self, _scope: Scope, _key: &str) -> Result<Option<String>> {
            Err(LifeProgressError::Other("read-only filesystem".into()))
        }

        fn set_raw(&self, _scope: Scope, _key: &str, _value: &str) -> Result<()> {
            Err(LifeProgressError::Other("read-only filesystem".into()))
        }

        fn remove(&self, _scope: Scope, _key: &str) -> Result<bool> {
            Err(LifeProgressError::Other("read-only filesystem".into()))
        }
    }

    #[test]
    fn test_source_selection_defaults_and_persists() {
        let h = harness();
        assert_eq!(h.provider.content_source(), SourceKind::Quote);

        assert!(h.provider.set_content_source(SourceKind::History));
        assert_eq!(h.provider.content_source(), SourceKind::History);
    }

    #[test]
    fn test_unreadable_selection_uses_default() {
        let h = harness();
        h.storage.set(CONTENT_SOURCE_KEY, &"weather", false);
        assert_eq!(h.provider.content_source(), SourceKind::Quote);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_quote_call_on_empty_store() {
        let h = harness();
        h.fetcher.push_quote(QUOTE_URL, "first");

        let item = h.provider.get_dynamic_content(false).await;

        assert_eq!(item.content, "first");
        assert_eq!(item.icon.as_deref(), Some("quote.bubble.fill"));
        assert_eq!(h.fetcher.calls(QUOTE_URL), 1);
        let pool = quote_pool(&h);
        assert_eq!(pool.items.len(), 1);
        assert_eq!(pool.items[0].content, "first");
        assert!(h.refiller.is_filling(SourceKind::Quote));
        settle(&h).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_of_three_wraps_index() {
        let h = harness();
        let now = Local::now();
        seed_quotes(&h, 3, 2, now.timestamp_millis());

        let item = h.provider.get_dynamic_content_at(false, now).await;

        assert_eq!(item.content, "pooled 2");
        assert_eq!(quote_pool(&h).current_index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_forced_refresh_matches_normal_serve() {
        let h = harness();
        let now = Local::now();
        seed_quotes(&h, 10, 7, (now - ChronoDuration::minutes(2)).timestamp_millis());
        h.fetcher.push_quote(QUOTE_URL, "unused");

        let forced = h.provider.get_dynamic_content_at(true, now).await;
        let normal = h.provider.get_dynamic_content_at(false, now).await;

        assert_eq!(forced, normal);
        assert_eq!(forced.content, "pooled 7");
        assert_eq!(h.fetcher.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatches_to_selected_source_with_icons() {
        let h = harness();
        h.fetcher.push_almanac("九月初八");
        h.provider.set_content_source(SourceKind::Almanac);

        let item = h.provider.get_dynamic_content(false).await;

        assert_eq!(item.title, "九月初八");
        assert_eq!(item.icon.as_deref(), Some("calendar.circle.fill"));
        assert_eq!(h.fetcher.calls(ALMANAC_URL), 1);
        assert_eq!(h.fetcher.calls(QUOTE_URL), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_gets_default_icon() {
        let h = harness();
        h.provider.set_content_source(SourceKind::History);

        let item = h.provider.get_dynamic_content(false).await;

        assert_eq!(item.content, SourceKind::History.fallback().content);
        assert_eq!(item.icon.as_deref(), Some("clock.arrow.circlepath"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_strategy_icon_is_kept() {
        let h = harness();
        let now = Local::now();
        let pool = QuoteCache::singleton(
            ContentItem::new("每日一言", "starry", "测试").with_icon("star.fill"),
        );
        h.storage.set(
            &SourceKind::Quote.cache_key(),
            &CachedItem::new(pool, now.timestamp_millis()),
            false,
        );

        let item = h.provider.get_dynamic_content_at(false, now).await;
        assert_eq!(item.icon.as_deref(), Some("star.fill"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_store_still_serves_fetched_content() {
        let h = harness_with(Arc::new(BrokenStore));
        h.fetcher.push_quote(QUOTE_URL, "one");
        h.fetcher.push_quote(QUOTE_URL, "two");

        let first = h.provider.get_dynamic_content(false).await;
        settle(&h).await;
        let second = h.provider.get_dynamic_content(false).await;

        assert_eq!(first.content, "one");
        assert_eq!(second.content, "two");
        assert_eq!(h.provider.content_source(), SourceKind::Quote);
        assert!(!h.provider.set_content_source(SourceKind::Almanac));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cache_forces_cold_start() {
        let h = harness();
        let now = Local::now();
        seed_quotes(&h, 3, 0, now.timestamp_millis());
        assert!(h.provider.cache_record(SourceKind::Quote).is_some());

        assert!(h.provider.clear_cache(SourceKind::Quote));
        assert!(h.provider.cache_record(SourceKind::Quote).is_none());
        assert!(!h.provider.clear_cache(SourceKind::Quote));
    }
}
