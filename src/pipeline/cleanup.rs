// src/pipeline/cleanup.rs

//! Index cleanup.
//!
//! Item records expire on their own, but the time indexes and day buckets
//! that point at them do not. This pass removes index entries older than the
//! retention window.

use chrono::{DateTime, Duration, Utc};

use crate::context::AppContext;
use crate::error::Result;
use crate::services::TimeIndex;
use crate::storage::keys;
use crate::utils::time::time_score;

/// What a cleanup pass removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    pub index_entries: u64,
    pub day_buckets: usize,
}

pub async fn run_cleanup(context: &AppContext) -> Result<CleanupReport> {
    run_cleanup_at(context, Utc::now()).await
}

/// Remove index entries published before `now - item_expire_days`, and
/// day buckets in the `item_expire_days` days preceding that cutoff.
pub async fn run_cleanup_at(context: &AppContext, now: DateTime<Utc>) -> Result<CleanupReport> {
    let retention = i64::from(context.config.site.item_expire_days);
    let cutoff = time_score(now - Duration::days(retention));
    let index = TimeIndex::new(context);

    let mut report = CleanupReport::default();
    let scopes = std::iter::once(String::new()).chain(context.config.category_names());
    for category in scopes {
        let removed = index.prune(&category, cutoff).await?;
        if removed > 0 {
            log::debug!("Pruned {} entries from {}", removed, keys::time_index(&category));
        }
        report.index_entries += removed;
    }

    let today = now.date_naive();
    for back in (retention + 1)..=(retention * 2) {
        let Some(day) = today.checked_sub_signed(Duration::days(back)) else {
            break;
        };
        if context.store.del(&keys::rank_day(day)).await? {
            report.day_buckets += 1;
        }
    }

    log::info!(
        "Cleanup removed {} index entries and {} day buckets",
        report.index_entries,
        report.day_buckets
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Channel, Config, ItemRecord};
    use crate::services::{ClickRankIndex, ItemStore};
    use crate::utils::time::format_pub_date;

    #[tokio::test]
    async fn test_cleanup_prunes_old_entries() {
        let mut config = Config::default();
        config
            .feed
            .channels
            .push(Channel::new("http://x/feed").with_category("tech"));
        let context = AppContext::in_memory(config);
        let items = ItemStore::new(&context);
        let now = Utc::now();

        for (link, days_ago) in [("http://x/new", 1), ("http://x/old", 45)] {
            let record = ItemRecord {
                link: link.into(),
                category: "tech".into(),
                pub_date: format_pub_date(now - Duration::days(days_ago)),
                ..ItemRecord::default()
            };
            items.put(record, 30).await.unwrap();
        }

        let rank = ClickRankIndex::new(&context);
        let stale_day = now.date_naive() - Duration::days(40);
        let fresh_day = now.date_naive() - Duration::days(2);
        rank.record_click("feed:item:1", stale_day).await.unwrap();
        rank.record_click("feed:item:1", fresh_day).await.unwrap();

        let report = run_cleanup_at(&context, now).await.unwrap();
        assert_eq!(report.index_entries, 2);
        assert_eq!(report.day_buckets, 1);

        let index = TimeIndex::new(&context);
        assert_eq!(index.len("").await.unwrap(), 1);
        assert_eq!(index.len("tech").await.unwrap(), 1);
        assert!(context.store.exists(&keys::rank_day(fresh_day)).await.unwrap());

        let again = run_cleanup_at(&context, now).await.unwrap();
        assert_eq!(again, CleanupReport::default());
    }
}
