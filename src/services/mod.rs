//! Service layer for the feed engine.
//!
//! This module contains the components the pipelines are built from:
//! - Link deduplication (`ExistenceIndex`)
//! - Item records and counters (`ItemStore`)
//! - Publication-time indexes (`TimeIndex`)
//! - Click ranking windows (`ClickRankIndex`)
//! - Keyword enrichment (`Dictionary`, `StoreDictionary`)
//! - Feed fetching (`FeedSource`, `HttpFeedSource`)

mod dictionary;
mod existence;
pub mod feeds;
mod items;
mod rank;
mod time_index;

pub use dictionary::{Dictionary, StoreDictionary};
pub use existence::ExistenceIndex;
pub use feeds::{FeedSource, HttpFeedSource};
pub use items::ItemStore;
pub use rank::ClickRankIndex;
pub use time_index::TimeIndex;
