// src/services/rank.rs

//! Click ranking.
//!
//! Outbound clicks are counted per calendar day in `feed:rank:{YYYYMMDD}`.
//! Multi-day windows are derived from those buckets on every read and
//! overwrite the previous window; they are never updated incrementally.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::context::AppContext;
use crate::error::Result;
use crate::models::Item;
use crate::services::ItemStore;
use crate::storage::{KvStore, WriteBatch, keys};
use crate::utils::time::trailing_days;

/// Day-bucketed click counts and the windows derived from them.
#[derive(Clone)]
pub struct ClickRankIndex {
    store: Arc<dyn KvStore>,
    items: ItemStore,
}

impl ClickRankIndex {
    pub fn new(context: &AppContext) -> Self {
        Self {
            store: Arc::clone(&context.store),
            items: ItemStore::new(context),
        }
    }

    /// Add one click for `item_key` in `today`'s bucket to `batch`.
    pub fn stage_click(batch: &mut WriteBatch, item_key: &str, today: NaiveDate) {
        batch.zincrby(keys::rank_day(today), 1.0, item_key);
    }

    /// Add one click for `item_key` in `today`'s bucket. Returns the new
    /// day score.
    pub async fn record_click(&self, item_key: &str, today: NaiveDate) -> Result<f64> {
        self.store
            .zincrby(&keys::rank_day(today), 1.0, item_key)
            .await
    }

    /// Rebuild the `days`-day window ending `today` and return its key.
    ///
    /// The global window is the sum of the trailing day buckets. A category
    /// window keeps only members of that category's time index, scored by
    /// the global window.
    pub async fn rebuild_window(
        &self,
        days: u32,
        category: &str,
        today: NaiveDate,
    ) -> Result<String> {
        let buckets: Vec<String> = trailing_days(today, days)
            .into_iter()
            .map(keys::rank_day)
            .collect();
        let weights = vec![1.0; buckets.len()];

        let global = keys::rank_window(days, "");
        let members = self.store.zunionstore(&global, &buckets, &weights).await?;
        log::debug!("Rebuilt {} from {} buckets ({} items)", global, buckets.len(), members);

        if category.is_empty() {
            return Ok(global);
        }

        let scoped = keys::rank_window(days, category);
        let sources = [keys::time_index(category), global];
        self.store
            .zinterstore(&scoped, &sources, &[0.0, 1.0])
            .await?;
        Ok(scoped)
    }

    /// Entries ranked `min_rank..=max_rank` (zero-based) in a window, highest
    /// score first.
    pub async fn range_by_rank(
        &self,
        window_key: &str,
        min_rank: usize,
        max_rank: usize,
    ) -> Result<Vec<(String, f64)>> {
        if max_rank < min_rank {
            return Ok(Vec::new());
        }
        self.store
            .zrevrange_withscores(window_key, min_rank, max_rank)
            .await
    }

    /// Resolve a rank range to items, each carrying its window score.
    pub async fn ranked_items(
        &self,
        window_key: &str,
        min_rank: usize,
        max_rank: usize,
    ) -> Result<Vec<Item>> {
        let ranked = self.range_by_rank(window_key, min_rank, max_rank).await?;
        let mut items = Vec::with_capacity(ranked.len());
        for (key, score) in ranked {
            let mut item = self.items.get_by_key(&key).await?;
            if item.is_absent() {
                continue;
            }
            item.rank_score = Some(score);
            items.push(item);
        }
        Ok(items)
    }
}
