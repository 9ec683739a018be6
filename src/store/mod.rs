pub mod sqlite;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app::Result;

pub use sqlite::SqliteStore;

/// Storage namespace. `Shared` is visible to every surface of the app
/// (widget, settings screen, intents); `Local` is private to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    Shared,
}

impl Scope {
    pub fn from_shared(shared: bool) -> Self {
        if shared {
            Scope::Shared
        } else {
            Scope::Local
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Local => "local",
            Scope::Shared => "shared",
        }
    }
}

/// Raw string key-value persistence.
pub trait KvStore {
    fn get_raw(&self, scope: Scope, key: &str) -> Result<Option<String>>;
    fn set_raw(&self, scope: Scope, key: &str, value: &str) -> Result<()>;
    fn remove(&self, scope: Scope, key: &str) -> Result<bool>;
}

/// Typed JSON access over a [`KvStore`] that never surfaces failures.
///
/// Reads fail closed to `None`, writes and removals report `false`; every
/// failure is logged. Callers keep working on whatever data they already
/// hold for the rest of the activation.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KvStore + Send + Sync>,
}

impl Storage {
    pub fn new(backend: Arc<dyn KvStore + Send + Sync>) -> Self {
        Self { backend }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, shared: bool) -> Option<T> {
        let raw = match self.backend.get_raw(Scope::from_shared(shared), key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::error!("Failed to read key {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding unreadable value for key {}: {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T, shared: bool) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Failed to serialize value for key {}: {}", key, e);
                return false;
            }
        };

        match self.backend.set_raw(Scope::from_shared(shared), key, &raw) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to write key {}: {}", key, e);
                false
            }
        }
    }

    pub fn remove(&self, key: &str, shared: bool) -> bool {
        match self.backend.remove(Scope::from_shared(shared), key) {
            Ok(removed) => removed,
            Err(e) => {
                tracing::error!("Failed to remove key {}: {}", key, e);
                false
            }
        }
    }

    /// The stored JSON text, unparsed.
    pub fn get_raw(&self, key: &str, shared: bool) -> Option<String> {
        self.backend
            .get_raw(Scope::from_shared(shared), key)
            .map_err(|e| tracing::error!("Failed to read key {}: {}", key, e))
            .ok()
            .flatten()
    }
}
