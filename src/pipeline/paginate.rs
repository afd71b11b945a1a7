// src/pipeline/paginate.rs

//! Page-numbered listings over the time and rank indexes.
//!
//! Pages are 1-based. Every call recomputes its result from persisted state,
//! so no cursor survives between calls. Store failures on these paths are
//! logged and produce an empty page.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::context::AppContext;
use crate::error::Result;
use crate::models::{Config, Item};
use crate::services::{ClickRankIndex, TimeIndex};
use crate::utils::time::window_bounds;

/// A 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(usize);

impl Page {
    pub fn new(number: usize) -> Self {
        Self(number.max(1))
    }

    /// Parse a page query parameter. Missing, unparseable or zero values
    /// mean the first page.
    pub fn from_query(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<usize>().ok())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn number(self) -> usize {
        self.0
    }

    /// Items skipped before this page.
    pub fn offset(self, count: usize) -> usize {
        count.saturating_mul(self.0 - 1)
    }

    /// Inclusive zero-based rank range covered by this page.
    pub fn rank_bounds(self, count: usize) -> Option<(usize, usize)> {
        if count == 0 {
            return None;
        }
        let min_rank = self.offset(count);
        Some((min_rank, min_rank.saturating_add(count - 1)))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self(1)
    }
}

/// Latest and most-clicked listings.
pub struct Paginator {
    config: Arc<Config>,
    index: TimeIndex,
    rank: ClickRankIndex,
}

impl Paginator {
    pub fn new(context: &AppContext) -> Self {
        Self {
            config: Arc::clone(&context.config),
            index: TimeIndex::new(context),
            rank: ClickRankIndex::new(context),
        }
    }

    /// Newest items of the last `site.item_days` days.
    pub async fn latest(&self, page: Page, category: &str) -> Vec<Item> {
        self.latest_at(page, category, Utc::now()).await
    }

    pub async fn latest_at(&self, page: Page, category: &str, now: DateTime<Utc>) -> Vec<Item> {
        let count = self.config.site.page_new_item_count;
        let (min, max) = window_bounds(now, self.config.site.item_days);
        let result = self
            .index
            .range_by_window(category, min, max, page.offset(count), count)
            .await;
        degrade("latest", result)
    }

    /// Most-clicked items of the last `site.item_days` days.
    pub async fn ranked(&self, page: Page, category: &str) -> Vec<Item> {
        self.ranked_at(page, category, Utc::now().date_naive()).await
    }

    pub async fn ranked_at(&self, page: Page, category: &str, today: NaiveDate) -> Vec<Item> {
        let Some((min_rank, max_rank)) = page.rank_bounds(self.config.site.page_rank_item_count)
        else {
            return Vec::new();
        };
        let result = self.ranked_range(category, today, min_rank, max_rank).await;
        degrade("ranked", result)
    }

    async fn ranked_range(
        &self,
        category: &str,
        today: NaiveDate,
        min_rank: usize,
        max_rank: usize,
    ) -> Result<Vec<Item>> {
        let window = self
            .rank
            .rebuild_window(self.config.site.item_days, category, today)
            .await?;
        self.rank.ranked_items(&window, min_rank, max_rank).await
    }
}

fn degrade(listing: &str, result: Result<Vec<Item>>) -> Vec<Item> {
    result.unwrap_or_else(|e| {
        log::warn!("{} listing unavailable: {}", listing, e);
        Vec::new()
    })
}

/// Keep only the items of `category`.
pub fn category_filter(items: Vec<Item>, category: &str) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| item.record.category == category)
        .collect()
}
