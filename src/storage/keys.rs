//! Store key names.

use chrono::NaiveDate;

use crate::models::ItemId;
use crate::utils::time::day_key;

pub const FEED_EXISTS: &str = "feed:exists";
pub const FEED_SEQUENCE: &str = "feed:seq";
pub const FEED_TIME: &str = "feed:time";
pub const FEED_TIME_PREFIX: &str = "feed:time:";
pub const FEED_ITEM_PREFIX: &str = "feed:item:";
pub const FEED_RANK_PREFIX: &str = "feed:rank:";
pub const FEED_RANK_DAYS_PREFIX: &str = "feed:rank:days:";
pub const DICT_EXISTS: &str = "dict:exists";
pub const DICT_ITEM_PREFIX: &str = "dict:item:";

/// Record key for an item.
pub fn item(id: ItemId) -> String {
    format!("{}{}", FEED_ITEM_PREFIX, id)
}

/// Parse the identity back out of a record key.
pub fn item_id(key: &str) -> Option<ItemId> {
    key.strip_prefix(FEED_ITEM_PREFIX)?.parse().ok().map(ItemId)
}

/// Time index for a category, or the global index when `category` is empty.
pub fn time_index(category: &str) -> String {
    if category.is_empty() {
        FEED_TIME.to_string()
    } else {
        format!("{}{}", FEED_TIME_PREFIX, category)
    }
}

/// Click bucket for one calendar day.
pub fn rank_day(day: NaiveDate) -> String {
    format!("{}{}", FEED_RANK_PREFIX, day_key(day))
}

/// Derived ranking window over `days` trailing buckets.
pub fn rank_window(days: u32, category: &str) -> String {
    if category.is_empty() {
        format!("{}{}", FEED_RANK_DAYS_PREFIX, days)
    } else {
        format!("{}{}:{}", FEED_RANK_DAYS_PREFIX, category, days)
    }
}

pub fn dict_item(keyword: &str) -> String {
    format!("{}{}", DICT_ITEM_PREFIX, keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key_round_trip() {
        let key = item(ItemId(42));
        assert_eq!(key, "feed:item:42");
        assert_eq!(item_id(&key), Some(ItemId(42)));
        assert_eq!(item_id("feed:time:42"), None);
    }

    #[test]
    fn test_time_index_names() {
        assert_eq!(time_index(""), "feed:time");
        assert_eq!(time_index("tech"), "feed:time:tech");
    }

    #[test]
    fn test_rank_keys() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(rank_day(day), "feed:rank:20260309");
        assert_eq!(rank_window(7, ""), "feed:rank:days:7");
        assert_eq!(rank_window(7, "tech"), "feed:rank:days:tech:7");
    }
}
