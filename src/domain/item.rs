use serde::{Deserialize, Serialize};

/// A single piece of displayable content: a quote, a historical event or
/// an almanac entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_content: Option<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            sub_content: None,
            source: source.into(),
            icon: None,
        }
    }

    pub fn with_sub_content(mut self, sub_content: impl Into<String>) -> Self {
        self.sub_content = Some(sub_content.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Two items are the same entry when their body text matches,
    /// regardless of title or attribution.
    pub fn same_content(&self, other: &ContentItem) -> bool {
        self.content == other.content
    }
}
