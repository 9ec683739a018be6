//! Configuration management for lifeprogress.
//!
//! Configuration is read from `~/.config/lifeprogress/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::SourceKind;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub content: ContentConfig,
    pub endpoints: EndpointConfig,
    pub fetch: FetchConfig,
    pub pool: PoolConfig,
}

/// Content selection used when nothing has been persisted yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub default_source: SourceKind,
}

/// One endpoint per source kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub quote_url: String,
    pub history_url: String,
    pub almanac_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            quote_url: "https://v1.hitokoto.cn/?c=i&c=d&c=k".to_string(),
            history_url: "https://v2.xxapi.cn/api/history".to_string(),
            almanac_url: "https://v2.xxapi.cn/api/huangli".to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn url_for(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Quote => &self.quote_url,
            SourceKind::History => &self.history_url,
            SourceKind::Almanac => &self.almanac_url,
        }
    }
}

/// Network behaviour of a single fetch.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Deadline for the whole attempt chain, retries included (default: 10)
    pub timeout_secs: u64,

    /// Retries after the first attempt (default: 3)
    pub retry_count: u32,

    /// Backoff before retry `n` is `backoff_base_ms * 2^n` (default: 1000)
    pub backoff_base_ms: u64,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retry_count: 3,
            backoff_base_ms: 1000,
            user_agent: format!("lifeprogress/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << attempt.min(32)))
    }
}

/// Rotating pool sizing and refresh cadence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum items kept in a pool (default: 10)
    pub capacity: usize,

    /// Pause between network calls while refilling (default: 500)
    pub refill_pause_ms: u64,

    /// Minimum gap between two forced refreshes that hit the network (default: 600)
    pub refresh_throttle_secs: u64,

    /// Age after which a quote pool is refilled again (default: 86400)
    pub cache_duration_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            refill_pause_ms: 500,
            refresh_throttle_secs: 600,
            cache_duration_secs: 86_400,
        }
    }
}

impl PoolConfig {
    pub fn refill_pause(&self) -> Duration {
        Duration::from_millis(self.refill_pause_ms)
    }

    pub fn refresh_throttle_millis(&self) -> i64 {
        (self.refresh_throttle_secs as i64).saturating_mul(1000)
    }

    pub fn cache_duration_millis(&self) -> i64 {
        (self.cache_duration_secs as i64).saturating_mul(1000)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/lifeprogress/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("lifeprogress").join("config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# lifeprogress configuration

[content]
# Source used until one is chosen with `lifeprogress source <kind>`:
# "quote", "history" or "almanac"
default_source = "quote"

[endpoints]
quote_url = "https://v1.hitokoto.cn/?c=i&c=d&c=k"
history_url = "https://v2.xxapi.cn/api/history"
almanac_url = "https://v2.xxapi.cn/api/huangli"

[fetch]
# Deadline for one fetch including all retries, in seconds
timeout_secs = 10

# Retries after the first failed attempt
retry_count = 3

# Retry n waits backoff_base_ms * 2^n milliseconds
backoff_base_ms = 1000

[pool]
# Number of quotes kept for rotation
capacity = 10

# Pause between requests while filling the pool (milliseconds)
refill_pause_ms = 500

# A manual refresh only hits the network this long after the last write (seconds)
refresh_throttle_secs = 600

# Quote pools older than this are topped up again (seconds)
cache_duration_secs = 86400
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
