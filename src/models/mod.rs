// src/models/mod.rs

//! Domain models for the feed engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod dictionary;
mod feed;
mod item;

// Re-export all public types
pub use config::{
    Channel, ChannelCategory, Config, CrawlerConfig, FeedConfig, LoggingConfig, RedisConfig,
    SiteConfig,
};
pub use dictionary::{DictionaryEntry, DictionaryFile};
pub use feed::{FeedDocument, FeedEntry};
pub use item::{Item, ItemId, ItemRecord};
