// src/services/feeds.rs

//! Feed fetching and normalization.

use async_trait::async_trait;
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, FeedDocument, FeedEntry};
use crate::utils::http::{create_client, fetch_bytes};
use crate::utils::time::format_pub_date;
use crate::utils::{resolve, snippet};

/// Something that can turn a URL into a feed document.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FeedDocument>;
}

/// Fetches over HTTP and parses RSS, Atom or JSON Feed.
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<FeedDocument> {
        let body = fetch_bytes(&self.client, url).await?;
        parse_feed(url, &body)
    }
}

/// Parse a raw feed body fetched from `url`.
pub fn parse_feed(url: &str, body: &[u8]) -> Result<FeedDocument> {
    let feed = parser::parse(body).map_err(|e| AppError::malformed(url, e))?;
    Ok(normalize(url, feed))
}

fn normalize(url: &str, feed: Feed) -> FeedDocument {
    let link = feed
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_else(|| url.to_string());

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| normalize_entry(&link, entry))
        .collect();

    FeedDocument {
        title: feed.title.map(|t| t.content).unwrap_or_default(),
        link,
        entries,
    }
}

fn normalize_entry(feed_link: &str, entry: Entry) -> FeedEntry {
    let link = entry
        .links
        .first()
        .map(|l| resolve(feed_link, &l.href))
        .unwrap_or_default();

    // Missing dates stay empty and are indexed at the epoch.
    let published = entry
        .published
        .or(entry.updated)
        .map(format_pub_date)
        .unwrap_or_default();

    let summary = entry.summary.map(|s| s.content).unwrap_or_default();
    let content = entry
        .content
        .and_then(|c| c.body)
        .unwrap_or_else(|| summary.clone());

    let content_snippet = if summary.is_empty() {
        snippet(&content)
    } else {
        snippet(&summary)
    };

    FeedEntry {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        link,
        author: entry
            .authors
            .into_iter()
            .map(|person| person.name)
            .collect::<Vec<_>>()
            .join(", "),
        published,
        content,
        content_snippet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example Feed</title>
    <link>http://x/</link>
    <item>
      <title>Foo</title>
      <link>http://x/1</link>
      <pubDate>Mon, 09 Mar 2026 08:05:00 +0000</pubDate>
      <description><![CDATA[<p>see <img src="http://img.example/pic.jpg"/> here</p>]]></description>
    </item>
    <item>
      <title>Bar</title>
      <link>/2</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss() {
        let doc = parse_feed("http://x/feed", RSS.as_bytes()).unwrap();
        assert_eq!(doc.title, "Example Feed");
        assert_eq!(doc.link, "http://x/");
        assert_eq!(doc.entries.len(), 2);

        let first = &doc.entries[0];
        assert_eq!(first.title, "Foo");
        assert_eq!(first.link, "http://x/1");
        assert_eq!(first.published, "Mon, 09 Mar 2026 08:05:00 +0000");
        assert!(first.content.contains("http://img.example/pic.jpg"));
        assert_eq!(first.content_snippet, "see here");
    }

    #[test]
    fn test_relative_link_and_missing_date() {
        let doc = parse_feed("http://x/feed", RSS.as_bytes()).unwrap();
        let second = &doc.entries[1];
        assert_eq!(second.link, "http://x/2");
        assert!(second.published.is_empty());
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_feed("http://x/feed", b"not a feed").unwrap_err();
        assert!(matches!(err, AppError::MalformedUpstream { .. }));
    }
}
