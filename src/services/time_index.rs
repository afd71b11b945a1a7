// src/services/time_index.rs

//! Publication-time indexes.
//!
//! Every item is a member of the global index and, when categorized, of its
//! category's index. Members are item keys scored by [`time_score`].
//!
//! [`time_score`]: crate::utils::time::time_score

use std::sync::Arc;

use crate::context::AppContext;
use crate::error::Result;
use crate::models::Item;
use crate::services::ItemStore;
use crate::storage::{KvStore, WriteBatch, keys};

/// Time-ordered views over stored items.
#[derive(Clone)]
pub struct TimeIndex {
    store: Arc<dyn KvStore>,
    items: ItemStore,
}

impl TimeIndex {
    pub fn new(context: &AppContext) -> Self {
        Self {
            store: Arc::clone(&context.store),
            items: ItemStore::new(context),
        }
    }

    /// Add index writes for one item to `batch`.
    pub fn stage(batch: &mut WriteBatch, item_key: &str, score: f64, category: &str) {
        batch.zadd(keys::FEED_TIME, score, item_key);
        if !category.is_empty() {
            batch.zadd(keys::time_index(category), score, item_key);
        }
    }

    /// Item keys with scores in `[min, max]`, newest first.
    async fn keys_by_window(
        &self,
        category: &str,
        min: f64,
        max: f64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<String>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.store
            .zrevrangebyscore(&keys::time_index(category), max, min, offset, limit)
            .await
    }

    /// Items with scores in `[min, max]`, newest first. An empty category
    /// selects the global index.
    pub async fn range_by_window(
        &self,
        category: &str,
        min: f64,
        max: f64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Item>> {
        let keys = self
            .keys_by_window(category, min, max, offset, limit)
            .await?;
        self.items.get_many(&keys).await
    }

    /// Drop index members scored strictly below `before`.
    pub async fn prune(&self, category: &str, before: f64) -> Result<u64> {
        self.store
            .zremrangebyscore(&keys::time_index(category), 0.0, before - 1.0)
            .await
    }

    pub async fn len(&self, category: &str) -> Result<u64> {
        self.store.zcard(&keys::time_index(category)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Config, ItemRecord};
    use crate::utils::time::{format_pub_date, time_score};
    use chrono::{Duration, TimeZone, Utc};

    async fn put_at(context: &AppContext, link: &str, category: &str, hours_ago: i64) {
        let record = ItemRecord {
            link: link.into(),
            category: category.into(),
            pub_date: format_pub_date(Utc::now() - Duration::hours(hours_ago)),
            ..ItemRecord::default()
        };
        ItemStore::new(context).put(record, 30).await.unwrap();
    }

    #[test]
    fn test_stage_respects_category() {
        let mut batch = WriteBatch::new();
        TimeIndex::stage(&mut batch, "feed:item:1", 1.0, "");
        assert_eq!(batch.len(), 1);

        let mut batch = WriteBatch::new();
        TimeIndex::stage(&mut batch, "feed:item:1", 1.0, "tech");
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test]
    async fn test_range_newest_first_with_offset() {
        let context = AppContext::in_memory(Config::default());
        put_at(&context, "http://x/old", "", 30).await;
        put_at(&context, "http://x/mid", "", 20).await;
        put_at(&context, "http://x/new", "", 10).await;

        let index = TimeIndex::new(&context);
        let now = Utc::now();
        let (min, max) = (
            time_score(now - Duration::days(7)),
            time_score(now),
        );

        let all = index.range_by_window("", min, max, 0, 10).await.unwrap();
        let links: Vec<_> = all.iter().map(|i| i.record.link.as_str()).collect();
        assert_eq!(links, vec!["http://x/new", "http://x/mid", "http://x/old"]);

        let second = index.range_by_window("", min, max, 1, 1).await.unwrap();
        assert_eq!(second[0].record.link, "http://x/mid");
        assert!(index.range_by_window("", min, max, 0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_window_excludes_other_categories() {
        let context = AppContext::in_memory(Config::default());
        put_at(&context, "http://x/tech", "tech", 1).await;
        put_at(&context, "http://x/news", "news", 1).await;

        let index = TimeIndex::new(&context);
        let tech = index
            .range_by_window("tech", 0.0, f64::MAX, 0, 10)
            .await
            .unwrap();
        assert_eq!(tech.len(), 1);
        assert_eq!(tech[0].record.category, "tech");
        assert_eq!(index.len("").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_prune_removes_older_members() {
        let context = AppContext::in_memory(Config::default());
        put_at(&context, "http://x/new", "", 1).await;
        put_at(&context, "http://x/old", "", 24 * 20).await;

        let index = TimeIndex::new(&context);
        let cutoff = time_score(Utc::now() - Duration::days(10));
        assert_eq!(index.prune("", cutoff).await.unwrap(), 1);
        assert_eq!(index.len("").await.unwrap(), 1);

        let epoch = time_score(Utc.timestamp_opt(0, 0).unwrap());
        assert_eq!(index.prune("", epoch).await.unwrap(), 0);
    }
}
