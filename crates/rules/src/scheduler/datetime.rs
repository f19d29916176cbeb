//! Base datetime parsing for record fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Parse a record field into a UTC timestamp.
///
/// Accepts RFC 3339 strings (any offset, normalized to UTC) and plain
/// `YYYY-MM-DD` dates, which are taken as midnight UTC. Anything else,
/// including non-string values, is unavailable.
pub fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
