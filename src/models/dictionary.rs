//! Dictionary entries used for keyword enrichment.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Affiliate metadata stored for a tracked keyword.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// The keyword itself; part of the key, not of the stored fields
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub advertiser: String,
    /// Name of the dictionary the keyword came from
    #[serde(default)]
    pub dict: String,
    #[serde(default)]
    pub affiliate_url: String,
    #[serde(default)]
    pub affiliate_item_id: String,
    #[serde(default)]
    pub list_image: String,
    /// Newline-joined sample image URLs
    #[serde(default)]
    pub images: String,
}

impl DictionaryEntry {
    pub fn to_fields(&self) -> Vec<(String, String)> {
        [
            ("advertiser", &self.advertiser),
            ("dict", &self.dict),
            ("affiliate_url", &self.affiliate_url),
            ("affiliate_item_id", &self.affiliate_item_id),
            ("list_image", &self.list_image),
            ("images", &self.images),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
    }

    pub fn from_fields(keyword: &str, fields: &HashMap<String, String>) -> Self {
        let text = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            keyword: keyword.to_string(),
            advertiser: text("advertiser"),
            dict: text("dict"),
            affiliate_url: text("affiliate_url"),
            affiliate_item_id: text("affiliate_item_id"),
            list_image: text("list_image"),
            images: text("images"),
        }
    }
}

/// Dictionary import file.
///
/// ```toml
/// [[entries]]
/// keyword = "Foo"
/// advertiser = "Example"
/// affiliate_url = "https://aff.example/foo"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictionaryFile {
    #[serde(default)]
    pub entries: Vec<DictionaryEntry>,
}

impl DictionaryFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_exclude_keyword() {
        let entry = DictionaryEntry {
            keyword: "Foo".into(),
            advertiser: "Example".into(),
            ..DictionaryEntry::default()
        };
        let fields = entry.to_fields();
        assert!(fields.iter().all(|(name, _)| name != "keyword"));

        let map: HashMap<String, String> = fields.into_iter().collect();
        assert_eq!(DictionaryEntry::from_fields("Foo", &map), entry);
    }

    #[test]
    fn test_parse_import_file() {
        let file: DictionaryFile = toml::from_str(
            r#"
            [[entries]]
            keyword = "Foo"
            advertiser = "Example"
            images = "http://img/a.jpg\nhttp://img/b.jpg"

            [[entries]]
            keyword = "Bar"
            "#,
        )
        .unwrap();
        assert_eq!(file.entries.len(), 2);
        assert_eq!(file.entries[0].advertiser, "Example");
        assert_eq!(file.entries[0].images.lines().count(), 2);
        assert!(file.entries[1].affiliate_url.is_empty());
    }
}
