// src/pipeline/ingest.rs

//! Feed ingestion pipeline.
//!
//! Each channel is fetched, its entries normalized, deduplicated against the
//! existence set, optionally enriched from the dictionary, and written.
//! Channels run concurrently; a failing channel or entry never stops the
//! others.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::context::AppContext;
use crate::error::Result;
use crate::models::{Channel, FeedDocument, FeedEntry, ItemId, ItemRecord};
use crate::services::{
    Dictionary, ExistenceIndex, FeedSource, HttpFeedSource, ItemStore, StoreDictionary,
};
use crate::utils::{extract_image_link, find_matching_word};

/// What happened to a single feed entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Stored(ItemId),
    /// Link already ingested, possibly by a concurrent run
    Duplicate,
    /// Dictionary channel and no keyword in the title
    Unmatched,
    /// Entry without a link
    Invalid,
}

/// Counters for one channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelReport {
    pub url: String,
    pub fetched: usize,
    pub stored: usize,
    pub duplicates: usize,
    pub unmatched: usize,
    pub invalid: usize,
    pub failed: usize,
    pub fetch_error: Option<String>,
}

impl ChannelReport {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    fn count(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Stored(_) => self.stored += 1,
            EntryOutcome::Duplicate => self.duplicates += 1,
            EntryOutcome::Unmatched => self.unmatched += 1,
            EntryOutcome::Invalid => self.invalid += 1,
        }
    }
}

/// Result of an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub channels: Vec<ChannelReport>,
}

impl IngestReport {
    pub fn stored(&self) -> usize {
        self.channels.iter().map(|c| c.stored).sum()
    }

    pub fn duplicates(&self) -> usize {
        self.channels.iter().map(|c| c.duplicates).sum()
    }

    pub fn failed_entries(&self) -> usize {
        self.channels.iter().map(|c| c.failed).sum()
    }

    pub fn failed_channels(&self) -> usize {
        self.channels
            .iter()
            .filter(|c| c.fetch_error.is_some())
            .count()
    }

    fn log_summary(&self) {
        let elapsed = self.finished_at - self.started_at;
        log::info!(
            target: "colle::ingest",
            "Ingested {} channels in {}ms: {} stored, {} duplicates, {} failed entries, {} failed channels",
            self.channels.len(),
            elapsed.num_milliseconds(),
            self.stored(),
            self.duplicates(),
            self.failed_entries(),
            self.failed_channels()
        );
        for channel in &self.channels {
            log::debug!(
                target: "colle::ingest",
                "{}: fetched={} stored={} duplicates={} unmatched={} invalid={} failed={}",
                channel.url,
                channel.fetched,
                channel.stored,
                channel.duplicates,
                channel.unmatched,
                channel.invalid,
                channel.failed
            );
        }
    }
}

/// Runs channels through fetch, dedup, enrichment and write.
pub struct Ingestor {
    context: AppContext,
    source: Arc<dyn FeedSource>,
    dictionary: Arc<dyn Dictionary>,
    existence: ExistenceIndex,
    items: ItemStore,
}

impl Ingestor {
    pub fn new(
        context: &AppContext,
        source: Arc<dyn FeedSource>,
        dictionary: Arc<dyn Dictionary>,
    ) -> Self {
        Self {
            context: context.clone(),
            source,
            dictionary,
            existence: ExistenceIndex::new(context),
            items: ItemStore::new(context),
        }
    }

    /// Ingest every channel once.
    pub async fn run(&self, channels: &[Channel]) -> IngestReport {
        let started_at = Utc::now();
        let keywords = self.load_keywords(channels).await;
        let concurrency = self.context.config.crawler.max_concurrent.max(1);

        let channels: Vec<ChannelReport> = stream::iter(channels)
            .map(|channel| self.ingest_channel(channel, &keywords))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let report = IngestReport {
            started_at,
            finished_at: Utc::now(),
            channels,
        };
        report.log_summary();
        report
    }

    /// Dictionary keywords, loaded only when a channel needs them.
    async fn load_keywords(&self, channels: &[Channel]) -> Vec<String> {
        if !channels.iter().any(|c| c.is_dict) {
            return Vec::new();
        }
        match self.dictionary.keywords().await {
            Ok(keywords) => {
                log::debug!("Loaded {} dictionary keywords", keywords.len());
                keywords
            }
            Err(e) => {
                log::warn!("Dictionary unavailable, dictionary channels will match nothing: {}", e);
                Vec::new()
            }
        }
    }

    async fn ingest_channel(&self, channel: &Channel, keywords: &[String]) -> ChannelReport {
        let mut report = ChannelReport::new(&channel.url);

        let feed = match self.source.fetch(&channel.url).await {
            Ok(feed) => feed,
            Err(e) => {
                log::warn!("Failed to fetch {}: {}", channel.url, e);
                report.fetch_error = Some(e.to_string());
                return report;
            }
        };
        report.fetched = feed.entries.len();

        for entry in &feed.entries {
            match self.ingest_entry(channel, &feed, entry, keywords).await {
                Ok(outcome) => report.count(&outcome),
                Err(e) => {
                    log::warn!("Failed to store {}: {}", entry.link, e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn ingest_entry(
        &self,
        channel: &Channel,
        feed: &FeedDocument,
        entry: &FeedEntry,
        keywords: &[String],
    ) -> Result<EntryOutcome> {
        let link = entry.link.trim();
        if link.is_empty() {
            return Ok(EntryOutcome::Invalid);
        }
        if self.existence.exists(link).await? {
            return Ok(EntryOutcome::Duplicate);
        }

        let mut record = ItemRecord {
            feed_title: feed.title.clone(),
            feed_link: feed.link.clone(),
            title: entry.title.clone(),
            image_link: extract_image_link(&entry.content),
            pub_date: entry.published.clone(),
            content: entry.content_snippet.clone(),
            link: link.to_string(),
            category: channel.category.clone(),
            ..ItemRecord::default()
        };

        if channel.is_dict {
            let Some(keyword) = find_matching_word(&entry.title, keywords) else {
                return Ok(EntryOutcome::Unmatched);
            };
            let detail = self.dictionary.detail(keyword).await?;
            record.attach_match(keyword, &detail);
        }

        // Another writer may have claimed the link since the check above.
        if !self.existence.insert(link).await? {
            return Ok(EntryOutcome::Duplicate);
        }

        let retention = self.context.config.site.item_expire_days;
        match self.items.put(record, retention).await {
            Ok(id) => Ok(EntryOutcome::Stored(id)),
            Err(e) => {
                if let Err(release_err) = self.existence.release(link).await {
                    log::warn!("Failed to release claim on {}: {}", link, release_err);
                }
                Err(e)
            }
        }
    }
}

/// Ingest all configured channels over HTTP.
pub async fn run_ingest(context: &AppContext) -> Result<IngestReport> {
    let source = Arc::new(HttpFeedSource::new(&context.config.crawler)?);
    let dictionary = Arc::new(StoreDictionary::new(context));
    let ingestor = Ingestor::new(context, source, dictionary);

    let channels = context.config.feed.channels.clone();
    log::info!("Ingesting {} channels", channels.len());
    Ok(ingestor.run(&channels).await)
}
