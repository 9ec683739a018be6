use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::app::{LifeProgressError, Result};
use crate::domain::source::FALLBACK_SOURCE;
use crate::domain::{ContentItem, SourceKind};

const HISTORY_SOURCE: &str = "历史百科";
const ALMANAC_SOURCE: &str = "老黄历";

static HISTORY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+年\d+月\d+日)\s+(.+)$").expect("history line pattern is valid")
});

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    hitokoto: Option<String>,
    from: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    code: Option<i64>,
    #[serde(default)]
    data: Value,
}

/// Turns raw endpoint bodies into [`ContentItem`]s.
#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse a single-item body. History bodies yield their first event.
    pub fn normalize(&self, kind: SourceKind, body: &[u8]) -> Result<ContentItem> {
        match kind {
            SourceKind::Quote => self.normalize_quote(body),
            SourceKind::Almanac => self.normalize_almanac(body),
            SourceKind::History => self
                .normalize_history(body)?
                .into_iter()
                .next()
                .ok_or_else(|| LifeProgressError::Parse("history list is empty".into())),
        }
    }

    pub fn normalize_quote(&self, body: &[u8]) -> Result<ContentItem> {
        let response: QuoteResponse = serde_json::from_slice(body)
            .map_err(|e| LifeProgressError::Parse(format!("quote response: {}", e)))?;

        let text = response
            .hitokoto
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LifeProgressError::Parse("quote response has no hitokoto".into()))?;
        let from = response
            .from
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_SOURCE.to_string());

        Ok(ContentItem::new(SourceKind::Quote.label(), text, from))
    }

    pub fn normalize_almanac(&self, body: &[u8]) -> Result<ContentItem> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| LifeProgressError::Parse(format!("almanac response: {}", e)))?;

        // Some mirrors wrap the fields in a `data` envelope.
        let fields = if value.get("农历日期").is_some() {
            &value
        } else {
            value.get("data").unwrap_or(&value)
        };

        let lunar_date = fields
            .get("农历日期")
            .and_then(truthy_text)
            .ok_or_else(|| LifeProgressError::Parse("almanac response has no lunar date".into()))?;

        let label = |name: &str| fields.get(name).map(label_text).unwrap_or_default();

        Ok(ContentItem::new(
            lunar_date,
            format!("宜：{}\n忌：{}", label("宜"), label("忌")),
            ALMANAC_SOURCE,
        )
        .with_sub_content(format!("{} · {}", label("干支日期"), label("值日星神"))))
    }

    /// Parse the whole day's event list. An empty list is an error.
    pub fn normalize_history(&self, body: &[u8]) -> Result<Vec<ContentItem>> {
        let response: HistoryResponse = serde_json::from_slice(body)
            .map_err(|e| LifeProgressError::Parse(format!("history response: {}", e)))?;

        if response.code != Some(200) {
            return Err(LifeProgressError::Parse(format!(
                "history response code {:?}",
                response.code
            )));
        }

        let entries = response
            .data
            .as_array()
            .ok_or_else(|| LifeProgressError::Parse("history data is not a list".into()))?;

        let items: Vec<ContentItem> = entries.iter().filter_map(history_entry).collect();
        if items.is_empty() {
            return Err(LifeProgressError::Parse("history list is empty".into()));
        }

        Ok(items)
    }
}

fn history_entry(entry: &Value) -> Option<ContentItem> {
    let default_title = SourceKind::History.label();

    match entry {
        Value::String(line) => {
            let item = match HISTORY_LINE.captures(line) {
                Some(caps) => ContentItem::new(&caps[1], &caps[2], HISTORY_SOURCE),
                None => ContentItem::new(default_title, line.as_str(), HISTORY_SOURCE),
            };
            Some(item)
        }
        Value::Object(fields) => {
            let title = fields
                .get("title")
                .and_then(truthy_text)
                .or_else(|| fields.get("year").and_then(truthy_text))
                .unwrap_or_else(|| default_title.to_string());
            let content = fields
                .get("content")
                .and_then(truthy_text)
                .or_else(|| fields.get("event").and_then(truthy_text))
                .or_else(|| {
                    fields
                        .get("ls")
                        .map(label_text)
                        .filter(|text| !text.is_empty())
                })
                .unwrap_or_else(|| entry.to_string());
            let source = fields
                .get("source")
                .and_then(truthy_text)
                .unwrap_or_else(|| HISTORY_SOURCE.to_string());
            Some(ContentItem::new(title, content, source))
        }
        _ => None,
    }
}

/// Text of a scalar that would count as present: non-empty strings and
/// non-zero numbers.
fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
        _ => None,
    }
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts.iter().map(label_text).collect::<Vec<_>>().join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
