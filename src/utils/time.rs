//! Publication time handling.
//!
//! Feed dates arrive as RFC 1123 strings with a numeric zone. Indexes store
//! them as a sortable score: the UTC timestamp written `YYYYMMDDhhmmss` and
//! read as a number, so score order equals time order.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};

/// RFC 1123 with numeric zone, e.g. `Mon, 02 Jan 2006 15:04:05 -0700`.
pub const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Parse a feed publish date. Returns `None` for anything unparseable.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_pub_date(time: DateTime<Utc>) -> String {
    time.format(PUB_DATE_FORMAT).to_string()
}

/// Publish time used for indexing; unparseable dates fall back to the epoch.
pub fn normalize_pub_date(raw: &str) -> DateTime<Utc> {
    parse_pub_date(raw).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Sortable score for a point in time.
pub fn time_score(time: DateTime<Utc>) -> f64 {
    let date = i64::from(time.year()) * 10_000 + i64::from(time.month()) * 100
        + i64::from(time.day());
    let clock =
        i64::from(time.hour()) * 10_000 + i64::from(time.minute()) * 100 + i64::from(time.second());
    (date * 1_000_000 + clock) as f64
}

/// Score bounds `(min, max)` of a window covering the `days` before `now`.
pub fn window_bounds(now: DateTime<Utc>, days: u32) -> (f64, f64) {
    let start = now - Duration::days(i64::from(days));
    (time_score(start), time_score(now))
}

/// Day bucket suffix, `YYYYMMDD`.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y%m%d").to_string()
}

/// The `days` calendar days ending with `today`, oldest first.
pub fn trailing_days(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_signed(Duration::days(i64::from(back))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_numeric_zone() {
        let parsed = parse_pub_date("Mon, 02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_pub_date("yesterday").is_none());
        assert!(parse_pub_date("").is_none());
        assert_eq!(normalize_pub_date("nope"), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_format_round_trip() {
        let time = Utc.with_ymd_and_hms(2026, 3, 9, 8, 5, 0).unwrap();
        let formatted = format_pub_date(time);
        assert_eq!(formatted, "Mon, 09 Mar 2026 08:05:00 +0000");
        assert_eq!(parse_pub_date(&formatted), Some(time));
    }

    #[test]
    fn test_time_score_layout() {
        let time = Utc.with_ymd_and_hms(2026, 3, 9, 8, 5, 7).unwrap();
        assert_eq!(time_score(time), 20260309080507.0);
    }

    #[test]
    fn test_time_score_is_monotone() {
        let a = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(time_score(a) < time_score(b));
    }

    #[test]
    fn test_window_bounds() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let (min, max) = window_bounds(now, 7);
        assert_eq!(min, 20260302120000.0);
        assert_eq!(max, 20260309120000.0);
    }

    #[test]
    fn test_trailing_days() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let days = trailing_days(today, 3);
        assert_eq!(
            days.iter().map(|d| day_key(*d)).collect::<Vec<_>>(),
            vec!["20260227", "20260228", "20260301"]
        );
        assert!(trailing_days(today, 0).is_empty());
    }
}
