use chrono::{DateTime, Datelike, TimeZone};
use serde::{Deserialize, Serialize};

use crate::domain::ContentItem;

/// A cache payload together with the time it was written (epoch millis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedItem<T> {
    pub data: T,
    pub timestamp: i64,
}

impl<T> CachedItem<T> {
    pub fn new(data: T, timestamp: i64) -> Self {
        Self { data, timestamp }
    }

    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis - self.timestamp
    }
}

/// Round-robin access over a deduplicated list of items.
pub trait ContentPool {
    fn items(&self) -> &[ContentItem];
    fn current_index(&self) -> usize;

    /// The item at `current_index` reduced modulo the pool length.
    fn current(&self) -> Option<&ContentItem> {
        let items = self.items();
        if items.is_empty() {
            return None;
        }
        items.get(self.current_index() % items.len())
    }

    /// Index the next serve should use.
    fn next_index(&self) -> usize {
        match self.items().len() {
            0 => 0,
            len => (self.current_index() % len + 1) % len,
        }
    }

    fn contains(&self, item: &ContentItem) -> bool {
        self.items().iter().any(|it| it.same_content(item))
    }
}

/// Cross-day rotating pool of quotes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCache {
    pub items: Vec<ContentItem>,
    #[serde(default)]
    pub current_index: usize,
}

impl QuoteCache {
    pub fn singleton(item: ContentItem) -> Self {
        Self {
            items: vec![item],
            current_index: 0,
        }
    }

    /// Append `item` unless an entry with the same content exists.
    /// Returns whether the pool grew.
    pub fn push_unique(&mut self, item: ContentItem) -> bool {
        if self.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Put `item` at the front, trimming the tail to `capacity` and
    /// rewinding so the next serve returns it. Duplicates are refused.
    pub fn prepend_unique(&mut self, item: ContentItem, capacity: usize) -> bool {
        if self.contains(&item) {
            return false;
        }
        self.items.insert(0, item);
        self.items.truncate(capacity.max(1));
        self.current_index = 0;
        true
    }
}

impl ContentPool for QuoteCache {
    fn items(&self) -> &[ContentItem] {
        &self.items
    }

    fn current_index(&self) -> usize {
        self.current_index
    }
}

/// Today's historical events, rebuilt once per local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryCache {
    pub date: String,
    pub items: Vec<ContentItem>,
    #[serde(default)]
    pub current_index: usize,
}

impl HistoryCache {
    /// A freshly fetched day: the first item is served immediately, so
    /// the stored index already points past it. Repeated events keep only
    /// their first occurrence.
    pub fn fresh(date: String, fetched: Vec<ContentItem>) -> Self {
        let mut items: Vec<ContentItem> = Vec::with_capacity(fetched.len());
        for item in fetched {
            if !items.iter().any(|kept| kept.same_content(&item)) {
                items.push(item);
            }
        }

        let current_index = if items.is_empty() { 0 } else { 1 % items.len() };
        Self {
            date,
            items,
            current_index,
        }
    }
}

impl ContentPool for HistoryCache {
    fn items(&self) -> &[ContentItem] {
        &self.items
    }

    fn current_index(&self) -> usize {
        self.current_index
    }
}

/// The single almanac entry for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlmanacCache {
    pub date: String,
    pub item: ContentItem,
}

/// Local calendar date formatted as `YYYY-M-D`, without zero padding.
pub fn date_key<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    format!("{}-{}-{}", now.year(), now.month(), now.day())
}
