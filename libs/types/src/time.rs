//! Timestamp helpers
//!
//! Internal timestamps are i64 Unix nanoseconds; the wire carries ISO-8601
//! UTC strings. Conversion happens only at the boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix nanoseconds.
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_nanos() as i64
}

/// Convert Unix nanoseconds to a `DateTime<Utc>`.
pub fn to_datetime(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}

/// Convert a `DateTime<Utc>` back to Unix nanoseconds.
///
/// Saturates for dates outside the representable range (~2262).
pub fn from_datetime(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Render Unix nanoseconds as an ISO-8601 UTC string.
pub fn format_rfc3339(nanos: i64) -> String {
    to_datetime(nanos).to_rfc3339_opts(SecondsFormat::Micros, true)
}
