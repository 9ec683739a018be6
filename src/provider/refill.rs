use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::{CachedItem, QuoteCache, SourceKind};
use crate::fetcher::FetchExecutor;
use crate::store::Storage;

const IDLE_POLL: Duration = Duration::from_millis(100);

/// Set of sources with a refill in flight.
///
/// Entering is best-effort single flight: a caller that finds the source
/// already present skips its refill instead of waiting.
#[derive(Debug, Default)]
pub struct RefillGuard {
    filling: Mutex<HashSet<SourceKind>>,
}

impl RefillGuard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark `kind` as filling. `None` if it already was.
    pub fn try_enter(self: &Arc<Self>, kind: SourceKind) -> Option<RefillPermit> {
        let entered = self
            .filling
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind);

        entered.then(|| RefillPermit {
            guard: Arc::clone(self),
            kind,
        })
    }

    pub fn exit(&self, kind: SourceKind) {
        self.filling
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&kind);
    }

    pub fn is_filling(&self, kind: SourceKind) -> bool {
        self.filling
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&kind)
    }
}

/// Held for the duration of one refill; releases the guard entry on drop.
#[derive(Debug)]
pub struct RefillPermit {
    guard: Arc<RefillGuard>,
    kind: SourceKind,
}

impl Drop for RefillPermit {
    fn drop(&mut self) {
        self.guard.exit(self.kind);
    }
}

/// Tops a rotating pool up to capacity, one fetch at a time.
#[derive(Clone)]
pub struct PoolRefiller {
    storage: Storage,
    executor: FetchExecutor,
    guard: Arc<RefillGuard>,
    capacity: usize,
    pause: Duration,
}

impl PoolRefiller {
    pub fn new(
        storage: Storage,
        executor: FetchExecutor,
        guard: Arc<RefillGuard>,
        capacity: usize,
        pause: Duration,
    ) -> Self {
        Self {
            storage,
            executor,
            guard,
            capacity: capacity.max(1),
            pause,
        }
    }

    pub fn is_filling(&self, kind: SourceKind) -> bool {
        self.guard.is_filling(kind)
    }

    /// Start a detached refill. Returns `false` when one is already running
    /// for `kind`. The caller never waits on the task.
    pub fn spawn(&self, kind: SourceKind) -> bool {
        let Some(permit) = self.guard.try_enter(kind) else {
            debug!("Refill for {} already running, skipping", kind);
            return false;
        };

        let refiller = self.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let added = refiller.fill_pool(kind).await;
            info!("Background refill for {} added {} items", kind, added);
        });

        true
    }

    /// Wait up to `limit` for an in-flight refill of `kind` to finish.
    /// Returns whether the source is idle.
    pub async fn wait_idle(&self, kind: SourceKind, limit: Duration) -> bool {
        let idle = async {
            while self.is_filling(kind) {
                tokio::time::sleep(IDLE_POLL).await;
            }
        };
        tokio::time::timeout(limit, idle).await.is_ok()
    }

    /// Refill in the foreground. `None` when another refill holds the guard.
    pub async fn run(&self, kind: SourceKind) -> Option<usize> {
        let _permit = self.guard.try_enter(kind)?;
        Some(self.fill_pool(kind).await)
    }

    async fn fill_pool(&self, kind: SourceKind) -> usize {
        let key = kind.cache_key();
        let mut added = 0;
        let mut duplicates = 0;

        loop {
            let Some(cached) = self.storage.get::<CachedItem<QuoteCache>>(&key, false) else {
                debug!("No pool for {}, nothing to refill", kind);
                break;
            };
            if cached.data.items.len() >= self.capacity {
                break;
            }
            if duplicates >= self.capacity {
                debug!("Refill for {} keeps drawing duplicates, stopping", kind);
                break;
            }

            let item = match self.executor.fetch(kind).await {
                Ok(item) => item,
                Err(e) => {
                    warn!("Refill for {} stopped: {}", kind, e);
                    break;
                }
            };

            // Append to the freshest record; serves may have advanced the
            // index while the fetch was in flight.
            let Some(mut latest) = self.storage.get::<CachedItem<QuoteCache>>(&key, false) else {
                break;
            };
            if latest.data.items.len() >= self.capacity {
                break;
            }

            if latest.data.push_unique(item) {
                latest.timestamp = Utc::now().timestamp_millis();
                self.storage.set(&key, &latest, false);
                added += 1;
                duplicates = 0;
            } else {
                duplicates += 1;
            }

            tokio::time::sleep(self.pause).await;
        }

        added
    }
}
