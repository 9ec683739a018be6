//! # lifeprogress
//!
//! The dynamic content behind the Life Progress dashboard: a rotating
//! quote, today's events in history, or the day's almanac entry.
//!
//! ## Architecture
//!
//! ```text
//! ContentProvider → SourceStrategy → Storage / FetchExecutor → ContentItem
//! ```
//!
//! Each invocation is short-lived. Everything that must survive between
//! invocations (pools, rotation indices, the selected source) lives in the
//! key-value store.
//!
//! ## Quick Start
//!
//! ```bash
//! # Pick a source
//! lifeprogress source history
//!
//! # Show the next item
//! lifeprogress show
//!
//! # Ask for a fresh one (throttled)
//! lifeprogress show --refresh
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together store,
/// fetcher and provider.
pub mod app;

/// Command-line interface using clap.
///
/// - `show [--refresh]` - Show the current item
/// - `source [kind]` - Print or change the content source
/// - `refill` - Fill the quote pool in the foreground
/// - `cache <kind> [--clear]` - Inspect or clear a cache record
pub mod cli;

/// Configuration loaded from `~/.config/lifeprogress/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`ContentItem`](domain::ContentItem): one displayable entry
/// - [`SourceKind`](domain::SourceKind): quote, history or almanac
/// - Cache records: [`QuoteCache`](domain::QuoteCache),
///   [`HistoryCache`](domain::HistoryCache), [`AlmanacCache`](domain::AlmanacCache)
pub mod domain;

/// HTTP fetching with retry, backoff and a deadline.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for one GET
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`FetchExecutor`](fetcher::FetchExecutor): retrying, time-limited fetch + parse
pub mod fetcher;

/// Endpoint response parsing into [`ContentItem`](domain::ContentItem)s.
pub mod normalizer;

/// Source strategies, the pool refiller and the [`ContentProvider`](provider::ContentProvider).
pub mod provider;

/// Key-value persistence.
///
/// - [`KvStore`](store::KvStore): Raw string storage trait
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
/// - [`Storage`](store::Storage): Typed, failure-swallowing wrapper
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
