//! Small value types shared by artists and albums.
//!
//! These are plain data: unlike entities they never hydrate themselves.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::convert::{self, Converted};

/// Size label the service attaches to an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
    Mega,
    /// A label this library does not know (kept verbatim)
    Other(String),
}

impl ImageSize {
    fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "small" => Self::Small,
            "medium" => Self::Medium,
            "large" => Self::Large,
            "extralarge" => Self::ExtraLarge,
            "mega" => Self::Mega,
            other => Self::Other(other.to_string()),
        }
    }
}

/// An image served by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub size: ImageSize,
}

impl Image {
    /// Convert an `{"#text": url, "size": label}` entry.
    pub fn from_value(value: &Value) -> Converted<Self> {
        let url = convert::text(value.get("#text").unwrap_or(&Value::Null)).unwrap_or_default();
        let size = value
            .get("size")
            .and_then(Value::as_str)
            .map(ImageSize::from_label)
            .unwrap_or(ImageSize::Other(String::new()));
        Ok(Self { url, size })
    }

    /// Convert an image list, dropping entries without a URL (the service
    /// lists every size even when it has no picture).
    pub fn list_from_value(value: &Value) -> Converted<Vec<Self>> {
        let images = convert::list(value, Self::from_value)?;
        Ok(images.into_iter().filter(|i| !i.url.is_empty()).collect())
    }
}

/// A wiki entry: an artist biography or an album description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiEntry {
    pub published: Option<DateTime<Utc>>,
    pub summary: String,
    pub content: String,
}

impl WikiEntry {
    /// Convert a `{"published", "summary", "content"}` object.
    pub fn from_value(value: &Value) -> Converted<Self> {
        if !value.is_object() {
            return Err(format!("expected a wiki object, got {value}"));
        }

        let published = match value.get("published").and_then(Value::as_str) {
            Some(raw) if !raw.trim().is_empty() => Some(convert::datetime(&Value::from(raw))?),
            _ => None,
        };
        let text_of = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        Ok(Self {
            published,
            summary: text_of("summary"),
            content: text_of("content"),
        })
    }
}

impl fmt::Display for WikiEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

/// A user-applied tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub url: Option<String>,
}

impl Tag {
    pub fn from_value(value: &Value) -> Converted<Self> {
        let name = convert::text(value.get("name").unwrap_or(&Value::Null))?;
        let url = value
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.trim().is_empty())
            .map(str::to_string);
        Ok(Self { name, url })
    }

    /// Convert a `{"tag": [...]}` wrapper.
    pub fn list_from_value(value: &Value) -> Converted<Vec<Self>> {
        convert::nested_list(value, "tag", Self::from_value)
    }
}

/// Listening statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub listeners: Option<u64>,
    pub play_count: Option<u64>,
}

impl Stats {
    /// Convert a `{"listeners": "..", "playcount": ".."}` object.
    pub fn from_value(value: &Value) -> Converted<Self> {
        let count = |key: &str| match value.get(key) {
            Some(raw) if !raw.is_null() => convert::integer::<u64>(raw).map(Some),
            _ => Ok(None),
        };
        Ok(Self {
            listeners: count("listeners")?,
            play_count: count("playcount")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use serde_json::json;

    #[test]
    fn test_image_from_value() {
        let image = Image::from_value(&json!({"#text": "http://img/1.png", "size": "extralarge"})).unwrap();
        assert_eq!(image.url, "http://img/1.png");
        assert_eq!(image.size, ImageSize::ExtraLarge);
    }

    #[test]
    fn test_image_list_drops_blank_urls() {
        let raw = json!([
            {"#text": "http://img/s.png", "size": "small"},
            {"#text": "", "size": "mega"},
            {"#text": "http://img/x.png", "size": "poster"},
        ]);
        let images = Image::list_from_value(&raw).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].size, ImageSize::Other("poster".to_string()));
    }

    #[test]
    fn test_wiki_entry() {
        let raw = json!({
            "published": "Tue, 15 Sep 2009 05:39:26 +0000",
            "summary": " Cher is an American singer. ",
            "content": "Cher (born Cherilyn Sarkisian)...",
        });
        let wiki = WikiEntry::from_value(&raw).unwrap();
        assert_eq!(wiki.published.map(|d| d.year()), Some(2009));
        assert_eq!(wiki.summary, "Cher is an American singer.");
        assert_eq!(wiki.to_string(), "Cher is an American singer.");
    }

    #[test]
    fn test_wiki_entry_without_date() {
        let wiki = WikiEntry::from_value(&json!({"summary": "short"})).unwrap();
        assert!(wiki.published.is_none());
        assert!(wiki.content.is_empty());
        assert!(WikiEntry::from_value(&json!("text")).is_err());
    }

    #[test]
    fn test_tags() {
        let raw = json!({"tag": [
            {"name": "pop", "url": "https://www.last.fm/tag/pop"},
            {"name": "dance", "url": ""},
        ]});
        let tags = Tag::list_from_value(&raw).unwrap();
        assert_eq!(tags[0].name, "pop");
        assert!(tags[1].url.is_none());
    }

    #[test]
    fn test_stats() {
        let stats = Stats::from_value(&json!({"listeners": "1523012", "playcount": "23456789"})).unwrap();
        assert_eq!(stats.listeners, Some(1_523_012));
        assert_eq!(stats.play_count, Some(23_456_789));

        let partial = Stats::from_value(&json!({"listeners": "5"})).unwrap();
        assert_eq!(partial.play_count, None);
        assert!(Stats::from_value(&json!({"listeners": "many"})).is_err());
    }
}
