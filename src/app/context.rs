use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{LifeProgressError, Result};
use crate::config::Config;
use crate::fetcher::{FetchExecutor, Fetcher, HttpFetcher};
use crate::normalizer::Normalizer;
use crate::provider::ContentProvider;
use crate::store::{SqliteStore, Storage};

pub struct AppContext {
    pub config: Config,
    pub storage: Storage,
    pub provider: ContentProvider,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, config: Config) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(store, config)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(store, config)
    }

    fn with_store(store: Arc<SqliteStore>, config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);
        let executor = FetchExecutor::new(
            fetcher,
            Normalizer::new(),
            config.endpoints.clone(),
            config.fetch.clone(),
        );
        let storage = Storage::new(store);
        let provider = ContentProvider::new(storage.clone(), executor, &config);

        Ok(Self {
            config,
            storage,
            provider,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| LifeProgressError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("lifeprogress");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("lifeprogress.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceKind;

    #[test]
    fn test_in_memory_context_wires_provider() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();

        assert_eq!(ctx.provider.content_source(), SourceKind::Quote);
        assert!(ctx.provider.set_content_source(SourceKind::Almanac));
        assert_eq!(
            ctx.storage.get::<SourceKind>(crate::provider::CONTENT_SOURCE_KEY, false),
            Some(SourceKind::Almanac)
        );
    }

    #[test]
    fn test_on_disk_context_keeps_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lifeprogress.db");

        {
            let ctx = AppContext::new(Some(path.clone()), Config::default()).unwrap();
            ctx.provider.set_content_source(SourceKind::History);
        }

        let ctx = AppContext::new(Some(path), Config::default()).unwrap();
        assert_eq!(ctx.provider.content_source(), SourceKind::History);
    }
}
