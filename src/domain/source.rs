use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app::LifeProgressError;
use crate::domain::ContentItem;

/// Prefix shared by every per-source cache record.
pub const CACHE_KEY_PREFIX: &str = "quote_cache";

/// Attribution used by hardcoded fallback content.
pub const FALLBACK_SOURCE: &str = "Life Progress";

/// Where dynamic content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Quote,
    History,
    Almanac,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Quote, SourceKind::History, SourceKind::Almanac];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Quote => "quote",
            SourceKind::History => "history",
            SourceKind::Almanac => "almanac",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Quote => "每日一言",
            SourceKind::History => "历史上的今天",
            SourceKind::Almanac => "老黄历",
        }
    }

    /// Store key holding this source's cache record.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", CACHE_KEY_PREFIX, self.as_str())
    }

    pub fn default_icon(&self) -> &'static str {
        match self {
            SourceKind::Quote => "quote.bubble.fill",
            SourceKind::History => "clock.arrow.circlepath",
            SourceKind::Almanac => "calendar.circle.fill",
        }
    }

    /// Content shown when neither the network nor any cache can help.
    pub fn fallback(&self) -> ContentItem {
        let content = match self {
            SourceKind::Quote => "时间不等人，珍惜当下。",
            SourceKind::History => "探索历史，启迪未来。",
            SourceKind::Almanac => "顺应时节，从容生活。",
        };
        ContentItem::new(self.label(), content, FALLBACK_SOURCE)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = LifeProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quote" => Ok(SourceKind::Quote),
            "history" => Ok(SourceKind::History),
            "almanac" => Ok(SourceKind::Almanac),
            other => Err(LifeProgressError::UnknownSource(other.to_string())),
        }
    }
}
