//! Timestamp helpers for persisted rows.
//!
//! Timestamps are stored as RFC3339 text with millisecond precision.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Format a timestamp for storage.
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC3339 and the bare `YYYY-MM-DD HH:MM:SS` form `SQLite`'s
/// `CURRENT_TIMESTAMP` produces. Unparseable values fall back to the Unix
/// epoch so a single corrupt row cannot fail a whole page read.
#[must_use]
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Utc.from_utc_datetime(&naive);
    }

    DateTime::<Utc>::UNIX_EPOCH
}
