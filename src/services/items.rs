// src/services/items.rs

//! Item persistence.
//!
//! Records are written once, indexed in the same atomic batch, and afterwards
//! only touched by counter increments, which never recreate an expired
//! record. Reads never fail on a missing key: an expired or unknown item
//! comes back as [`Item::default()`].

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use futures::future::try_join_all;

use crate::context::AppContext;
use crate::error::Result;
use crate::models::{Item, ItemId, ItemRecord};
use crate::services::{ClickRankIndex, TimeIndex};
use crate::storage::{KvStore, WriteBatch, keys};
use crate::utils::time::{normalize_pub_date, time_score};

/// Reads and writes item records.
#[derive(Clone)]
pub struct ItemStore {
    store: Arc<dyn KvStore>,
}

impl ItemStore {
    pub fn new(context: &AppContext) -> Self {
        Self {
            store: Arc::clone(&context.store),
        }
    }

    /// Persist a new record and index it.
    ///
    /// The identity comes from the sequence; existence membership, both time
    /// indexes, the record hash and its expiry are applied as one batch. The
    /// record expires `retention_days` after its publish time.
    pub async fn put(&self, mut record: ItemRecord, retention_days: u32) -> Result<ItemId> {
        let id = ItemId(self.store.incr(keys::FEED_SEQUENCE).await?);
        record.id = id;

        let key = keys::item(id);
        let published = normalize_pub_date(&record.pub_date);
        let expires = published + Duration::days(i64::from(retention_days));

        let mut batch = WriteBatch::new();
        batch.sadd(keys::FEED_EXISTS, record.link.as_str());
        TimeIndex::stage(&mut batch, &key, time_score(published), &record.category);
        batch
            .hset(key.as_str(), record.to_fields())
            .expire_at(key.as_str(), expires.timestamp());

        self.store.apply(batch).await?;
        log::debug!("Stored {} ({})", key, record.link);
        Ok(id)
    }

    pub async fn get(&self, id: ItemId) -> Result<Item> {
        self.get_by_key(&keys::item(id)).await
    }

    pub async fn get_by_key(&self, key: &str) -> Result<Item> {
        let fields = self.store.hgetall(key).await?;
        Ok(Item::from_record(ItemRecord::from_fields(&fields)))
    }

    /// Resolve keys in order, dropping items that no longer exist.
    pub async fn get_many(&self, keys: &[String]) -> Result<Vec<Item>> {
        let items = try_join_all(keys.iter().map(|key| self.get_by_key(key))).await?;
        Ok(items.into_iter().filter(|item| !item.is_absent()).collect())
    }

    pub async fn exists(&self, id: ItemId) -> Result<bool> {
        self.store.exists(&keys::item(id)).await
    }

    /// Count an outbound click and credit today's rank bucket. Both writes
    /// happen only if the item still exists; returns whether they did.
    pub async fn increment_outbound_click(&self, id: ItemId) -> Result<bool> {
        self.increment_outbound_click_on(id, Utc::now().date_naive())
            .await
    }

    pub async fn increment_outbound_click_on(&self, id: ItemId, today: NaiveDate) -> Result<bool> {
        let key = keys::item(id);
        let mut batch = WriteBatch::new();
        batch.hincrby(key.as_str(), ItemRecord::FIELD_OUTLINK_CNT, 1);
        ClickRankIndex::stage_click(&mut batch, &key, today);
        self.store.apply_if_exists(&key, batch).await
    }

    /// Count an inbound view if the item still exists.
    pub async fn increment_inbound_view(&self, id: ItemId) -> Result<bool> {
        let key = keys::item(id);
        let mut batch = WriteBatch::new();
        batch.hincrby(key.as_str(), ItemRecord::FIELD_INLINK_CNT, 1);
        self.store.apply_if_exists(&key, batch).await
    }

    /// Serving-layer click entry point.
    pub async fn record_outbound_click(&self, id: ItemId) -> Result<bool> {
        let counted = self.increment_outbound_click(id).await?;
        if !counted {
            log::debug!("Click on missing item {}", id);
        }
        Ok(counted)
    }

    /// Serving-layer view entry point.
    pub async fn record_inbound_view(&self, id: ItemId) -> Result<bool> {
        let counted = self.increment_inbound_view(id).await?;
        if !counted {
            log::debug!("View on missing item {}", id);
        }
        Ok(counted)
    }

    /// Identity of the most recently stored item.
    pub async fn last_id(&self) -> Result<ItemId> {
        Ok(ItemId(self.store.counter(keys::FEED_SEQUENCE).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;
    use crate::utils::time::format_pub_date;

    fn record(link: &str, category: &str) -> ItemRecord {
        ItemRecord {
            title: "Foo".into(),
            link: link.into(),
            category: category.into(),
            pub_date: format_pub_date(Utc::now() - Duration::hours(1)),
            ..ItemRecord::default()
        }
    }

    fn setup() -> (AppContext, ItemStore) {
        let context = AppContext::in_memory(Config::default());
        let items = ItemStore::new(&context);
        (context, items)
    }

    #[tokio::test]
    async fn test_put_assigns_sequential_ids() {
        let (_, items) = setup();
        let first = items.put(record("http://x/1", ""), 30).await.unwrap();
        let second = items.put(record("http://x/2", ""), 30).await.unwrap();
        assert_eq!(first, ItemId(1));
        assert_eq!(second, ItemId(2));
        assert_eq!(items.last_id().await.unwrap(), ItemId(2));
    }

    #[tokio::test]
    async fn test_put_writes_record_and_indexes() {
        let (context, items) = setup();
        let id = items.put(record("http://x/1", "tech"), 30).await.unwrap();
        let key = keys::item(id);

        let item = items.get(id).await.unwrap();
        assert_eq!(item.id(), id);
        assert_eq!(item.record.link, "http://x/1");
        assert_eq!(item.record.outlink_cnt, 0);

        let store = &context.store;
        assert!(store.sismember(keys::FEED_EXISTS, "http://x/1").await.unwrap());
        assert_eq!(store.zcard(keys::FEED_TIME).await.unwrap(), 1);
        let in_category = store
            .zrevrangebyscore(&keys::time_index("tech"), f64::MAX, f64::MIN, 0, 10)
            .await
            .unwrap();
        assert_eq!(in_category, vec![key]);
    }

    #[tokio::test]
    async fn test_uncategorized_item_skips_category_index() {
        let (context, items) = setup();
        items.put(record("http://x/1", ""), 30).await.unwrap();
        assert_eq!(context.store.zcard("feed:time:").await.unwrap(), 0);
        assert_eq!(context.store.zcard(keys::FEED_TIME).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_item_is_default() {
        let (_, items) = setup();
        let item = items.get(ItemId(99)).await.unwrap();
        assert!(item.is_absent());
        assert_eq!(item, Item::default());
    }

    #[tokio::test]
    async fn test_expired_record_reads_absent() {
        let (_, items) = setup();
        let mut old = record("http://x/old", "");
        old.pub_date = format_pub_date(Utc::now() - Duration::days(40));
        let id = items.put(old, 30).await.unwrap();

        assert!(items.get(id).await.unwrap().is_absent());
        assert!(!items.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_many_drops_absent() {
        let (_, items) = setup();
        let id = items.put(record("http://x/1", ""), 30).await.unwrap();
        let keys = vec![keys::item(ItemId(50)), keys::item(id)];

        let found = items.get_many(&keys).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), id);
    }

    #[tokio::test]
    async fn test_counters_only_increase() {
        let (_, items) = setup();
        let id = items.put(record("http://x/1", ""), 30).await.unwrap();

        for _ in 0..3 {
            assert!(items.increment_outbound_click(id).await.unwrap());
        }
        assert!(items.increment_inbound_view(id).await.unwrap());

        let item = items.get(id).await.unwrap();
        assert_eq!(item.record.outlink_cnt, 3);
        assert_eq!(item.record.inlink_cnt, 1);
    }

    #[tokio::test]
    async fn test_click_credits_day_bucket() {
        let (context, items) = setup();
        let id = items.put(record("http://x/1", ""), 30).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();

        items.increment_outbound_click_on(id, today).await.unwrap();
        items.increment_outbound_click_on(id, today).await.unwrap();

        let bucket = context
            .store
            .zrevrange_withscores(&keys::rank_day(today), 0, 10)
            .await
            .unwrap();
        assert_eq!(bucket, vec![(keys::item(id), 2.0)]);
    }

    #[tokio::test]
    async fn test_click_on_expired_item_does_not_resurrect_it() {
        let (context, items) = setup();
        let mut old = record("http://x/old", "");
        old.pub_date = format_pub_date(Utc::now() - Duration::days(40));
        let id = items.put(old, 30).await.unwrap();
        let today = Utc::now().date_naive();

        assert!(!items.increment_outbound_click_on(id, today).await.unwrap());
        assert!(!items.increment_inbound_view(id).await.unwrap());
        assert!(!items.exists(id).await.unwrap());
        assert!(context.store.hgetall(&keys::item(id)).await.unwrap().is_empty());
        assert!(!context.store.exists(&keys::rank_day(today)).await.unwrap());

        assert!(!items.record_outbound_click(id).await.unwrap());
        assert!(!items.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_guarded_counters_ignore_missing_items() {
        let (context, items) = setup();
        assert!(!items.record_outbound_click(ItemId(7)).await.unwrap());
        assert!(!items.record_inbound_view(ItemId(7)).await.unwrap());
        assert!(!context.store.exists(&keys::item(ItemId(7))).await.unwrap());

        let id = items.put(record("http://x/1", ""), 30).await.unwrap();
        assert!(items.record_outbound_click(id).await.unwrap());
        assert!(items.record_inbound_view(id).await.unwrap());
    }
}
