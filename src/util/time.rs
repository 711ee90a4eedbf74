//! Date parsing and formatting helpers.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};

use crate::error::{MetricsError, Result};

/// Parse a strict `YYYY-MM-DD` date argument.
///
/// # Errors
///
/// Returns `InvalidDate` naming the field when the value doesn't parse.
pub fn parse_date(s: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| MetricsError::InvalidDate {
        field: field.to_string(),
        value: s.to_string(),
    })
}

/// Unix timestamp of midnight UTC on the given date.
#[must_use]
pub fn day_start(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// ISO year-week stamp (e.g. `2026-W35`) used in cache file names.
#[must_use]
pub fn week_stamp(now: DateTime<Utc>) -> String {
    now.format("%G-W%V").to_string()
}

/// Whole days elapsed between a Unix timestamp and a reference instant.
#[must_use]
pub fn days_since(ts: i64, now: i64) -> i64 {
    (now - ts).max(0) / 86_400
}

/// Timestamp cutoff three calendar months before `now`.
#[must_use]
pub fn three_months_before(now: DateTime<Utc>) -> i64 {
    now.checked_sub_months(Months::new(3)).unwrap_or(now).timestamp()
}

/// The most recent complete Monday-to-Monday week relative to `today`.
///
/// On a Monday the week just ended, so the window is the seven days
/// leading up to today. Any other day backs up to the Monday pair
/// before it.
#[must_use]
pub fn last_report_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days_from_monday = i64::from(today.weekday().num_days_from_monday());
    if days_from_monday == 0 {
        (today - Duration::days(7), today)
    } else {
        let end = today - Duration::days(days_from_monday);
        (end - Duration::days(7), end)
    }
}

/// `August 25, 2026` style date for report headings.
#[must_use]
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// `25 Aug, 2026` style date for the store timestamp report.
#[must_use]
pub fn short_date(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map_or_else(|| "-".to_string(), |dt| dt.format("%d %b, %Y").to_string())
}
