pub mod cache;
pub mod item;
pub mod source;

pub use cache::{date_key, AlmanacCache, CachedItem, ContentPool, HistoryCache, QuoteCache};
pub use item::ContentItem;
pub use source::SourceKind;
