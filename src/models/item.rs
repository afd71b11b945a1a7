//! Item record and its store representation.
//!
//! [`ItemRecord`] is the persisted schema. [`ItemRecord::to_fields`] and
//! [`ItemRecord::from_fields`] are the only place where it is converted to
//! and from the store's flat string map; every read and write path goes
//! through them.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DictionaryEntry;
use crate::utils::time::parse_pub_date;

/// Identity of a stored item. Carries no meaning beyond uniqueness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted fields of an ingested item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub feed_title: String,
    pub feed_link: String,
    pub title: String,
    pub image_link: String,
    /// Publish date as delivered by the feed (RFC 1123, numeric zone)
    pub pub_date: String,
    pub matching_word: String,
    /// Short content snippet
    pub content: String,
    /// Canonical link, the deduplication key
    pub link: String,
    pub outlink_cnt: u64,
    pub inlink_cnt: u64,
    /// Empty when the item is not categorized
    pub category: String,
    pub affiliate_url: String,
    pub affiliate_item_id: String,
    pub list_image: String,
    /// Newline-joined image URLs
    pub images: String,
}

impl ItemRecord {
    pub const FIELD_OUTLINK_CNT: &'static str = "outlink_cnt";
    pub const FIELD_INLINK_CNT: &'static str = "inlink_cnt";

    /// Attach a dictionary match to the record.
    pub fn attach_match(&mut self, keyword: &str, detail: &DictionaryEntry) {
        self.matching_word = keyword.to_string();
        self.affiliate_url = detail.affiliate_url.clone();
        self.affiliate_item_id = detail.affiliate_item_id.clone();
        self.list_image = detail.list_image.clone();
        self.images = detail.images.clone();
    }

    /// Flatten into store fields.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        [
            ("id", self.id.to_string()),
            ("feed_title", self.feed_title.clone()),
            ("feed_link", self.feed_link.clone()),
            ("title", self.title.clone()),
            ("image_link", self.image_link.clone()),
            ("pub_date", self.pub_date.clone()),
            ("matching_word", self.matching_word.clone()),
            ("content", self.content.clone()),
            ("link", self.link.clone()),
            (Self::FIELD_OUTLINK_CNT, self.outlink_cnt.to_string()),
            (Self::FIELD_INLINK_CNT, self.inlink_cnt.to_string()),
            ("category", self.category.clone()),
            ("affiliate_url", self.affiliate_url.clone()),
            ("affiliate_item_id", self.affiliate_item_id.clone()),
            ("list_image", self.list_image.clone()),
            ("images", self.images.clone()),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }

    /// Rebuild from store fields. Missing or malformed fields take their
    /// zero value, so an expired key yields `ItemRecord::default()`.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let text = |name: &str| fields.get(name).cloned().unwrap_or_default();
        let number = |name: &str| {
            fields
                .get(name)
                .and_then(|raw| raw.parse::<u64>().ok())
                .unwrap_or(0)
        };

        Self {
            id: ItemId(number("id")),
            feed_title: text("feed_title"),
            feed_link: text("feed_link"),
            title: text("title"),
            image_link: text("image_link"),
            pub_date: text("pub_date"),
            matching_word: text("matching_word"),
            content: text("content"),
            link: text("link"),
            outlink_cnt: number(Self::FIELD_OUTLINK_CNT),
            inlink_cnt: number(Self::FIELD_INLINK_CNT),
            category: text("category"),
            affiliate_url: text("affiliate_url"),
            affiliate_item_id: text("affiliate_item_id"),
            list_image: text("list_image"),
            images: text("images"),
        }
    }
}

/// An item as returned by the read paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Item {
    #[serde(flatten)]
    pub record: ItemRecord,
    /// Parsed publish time, `None` when the stored date is unparseable
    pub pub_time: Option<DateTime<Utc>>,
    pub affiliate_images: Vec<String>,
    /// Window score when the item came from a ranked query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_score: Option<f64>,
}

impl Item {
    /// Build the read view of a stored record.
    pub fn from_record(record: ItemRecord) -> Self {
        let pub_time = parse_pub_date(&record.pub_date);
        let affiliate_images = if record.images.is_empty() {
            Vec::new()
        } else {
            record.images.split('\n').map(str::to_string).collect()
        };
        Self {
            record,
            pub_time,
            affiliate_images,
            rank_score: None,
        }
    }

    /// An item whose key expired or never existed has an empty link.
    pub fn is_absent(&self) -> bool {
        self.record.link.is_empty()
    }

    pub fn id(&self) -> ItemId {
        self.record.id
    }
}
