//! Normalized feed documents.

use serde::{Deserialize, Serialize};

/// A fetched feed, reduced to the fields the pipeline uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub entries: Vec<FeedEntry>,
}

/// One entry of a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub author: String,
    /// RFC 1123 with numeric zone
    #[serde(default)]
    pub published: String,
    /// Full content, may contain HTML
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_snippet: String,
}
