//! Timestamp parsing and millisecond arithmetic.
//!
//! Every textual timestamp is parsed once, when a calculator is built, and kept as
//! milliseconds since the Unix epoch from then on.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};

use crate::error::{MetricsError, Result};

/// The number of milliseconds in one day.
pub const ONE_DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Parse an RFC 3339 timestamp into epoch milliseconds.
pub fn parse_millis(field: &str, value: &str) -> Result<i64> {
  DateTime::parse_from_rfc3339(value)
    .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
    .map_err(|e| MetricsError::timestamp(field, value, &format!("invalid RFC3339: {}", e)))
}

/// Parse an optional timestamp; `None` and empty strings mean "not set".
pub fn parse_optional_millis(field: &str, value: Option<&str>) -> Result<Option<i64>> {
  match value {
    Some(v) if !v.is_empty() => parse_millis(field, v).map(Some),
    _ => Ok(None),
  }
}

/// Parse a reference time given on the command line: RFC 3339 or a bare `YYYY-MM-DD`
/// (midnight UTC).
pub fn parse_reference(value: &str) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
    return Ok(dt.with_timezone(&Utc));
  }
  let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
    MetricsError::timestamp("now", value, &format!("expected RFC3339 or YYYY-MM-DD: {}", e))
  })?;
  let midnight = date
    .and_hms_opt(0, 0, 0)
    .ok_or_else(|| MetricsError::timestamp("now", value, "no midnight for date"))?;
  Ok(Utc.from_utc_datetime(&midnight))
}

/// Render epoch milliseconds as `YYYY-MM-DDTHH:MM:SSZ` for audit lines.
pub fn format_millis(ms: i64) -> String {
  match Utc.timestamp_millis_opt(ms).single() {
    Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    None => ms.to_string(),
  }
}

/// Earliest instant (exclusive) of a window of `days` ending at `now_ms`.
pub fn window_start(now_ms: i64, days: i64) -> i64 {
  now_ms - days * ONE_DAY_MS
}

/// Absolute distance between two instants, rounded to whole days.
pub fn days_between(a_ms: i64, b_ms: i64) -> i64 {
  ((a_ms - b_ms).abs() as f64 / ONE_DAY_MS as f64).round() as i64
}

pub fn ms_to_days(ms: f64) -> f64 {
  ms / ONE_DAY_MS as f64
}

/// Round to two decimals (half away from zero).
pub fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}
