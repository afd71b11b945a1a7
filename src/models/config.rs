//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listing and retention settings
    #[serde(default)]
    pub site: SiteConfig,

    /// Key-value store connection
    #[serde(default)]
    pub redis: RedisConfig,

    /// HTTP and fetching behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Feed channels and categories
    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.site.item_days == 0 {
            return Err(AppError::validation("site.item_days must be > 0"));
        }
        if self.site.item_expire_days == 0 {
            return Err(AppError::validation("site.item_expire_days must be > 0"));
        }
        if self.site.item_expire_days < self.site.item_days {
            return Err(AppError::validation(
                "site.item_expire_days must be >= site.item_days",
            ));
        }
        if self.site.page_new_item_count == 0 || self.site.page_rank_item_count == 0 {
            return Err(AppError::validation("site page counts must be > 0"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.redis.url.trim().is_empty() {
            return Err(AppError::validation("redis.url is empty"));
        }
        for channel in &self.feed.channels {
            if channel.url.trim().is_empty() {
                return Err(AppError::validation("feed channel with empty url"));
            }
            if !channel.category.is_empty()
                && !self.feed.categories.is_empty()
                && !self.feed.categories.iter().any(|c| c.dir == channel.category)
            {
                return Err(AppError::validation(format!(
                    "channel {} uses undeclared category '{}'",
                    channel.url, channel.category
                )));
            }
        }
        Ok(())
    }

    /// Distinct category names used by channels or declared in `feed.categories`.
    pub fn category_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .feed
            .categories
            .iter()
            .map(|c| c.dir.clone())
            .chain(self.feed.channels.iter().map(|c| c.category.clone()))
            .filter(|name| !name.is_empty())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Listing and retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Width in days of the latest and ranked windows
    #[serde(default = "defaults::item_days")]
    pub item_days: u32,

    /// Days after publication an item record expires
    #[serde(default = "defaults::item_expire_days")]
    pub item_expire_days: u32,

    #[serde(default = "defaults::page_new_item_count")]
    pub page_new_item_count: usize,

    #[serde(default = "defaults::page_rank_item_count")]
    pub page_rank_item_count: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            item_days: defaults::item_days(),
            item_expire_days: defaults::item_expire_days(),
            page_new_item_count: defaults::page_new_item_count(),
            page_rank_item_count: defaults::page_rank_item_count(),
        }
    }
}

/// Redis connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Connection URL; the path selects the database number
    #[serde(default = "defaults::redis_url")]
    pub url: String,

    /// Idle connections kept for reuse
    #[serde(default = "defaults::max_idle")]
    pub max_idle: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: defaults::redis_url(),
            max_idle: defaults::max_idle(),
        }
    }
}

/// HTTP client and fetching behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum channels fetched concurrently
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Feed sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub categories: Vec<ChannelCategory>,

    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// A category that channels can be tagged with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelCategory {
    /// Category key, also used in index names
    pub dir: String,

    /// Human-readable name
    #[serde(default)]
    pub label: String,
}

/// One configured feed source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub url: String,

    #[serde(default)]
    pub category: String,

    /// Only ingest entries whose title contains a dictionary keyword
    #[serde(default)]
    pub is_dict: bool,
}

impl Channel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_dictionary(mut self) -> Self {
        self.is_dict = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Site defaults
    pub fn item_days() -> u32 {
        7
    }
    pub fn item_expire_days() -> u32 {
        30
    }
    pub fn page_new_item_count() -> usize {
        20
    }
    pub fn page_rank_item_count() -> usize {
        10
    }

    // Store defaults
    pub fn redis_url() -> String {
        "redis://127.0.0.1:6379/0".into()
    }
    pub fn max_idle() -> usize {
        3
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; colle/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        5
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
