//! Date parsing and day arithmetic.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses an RFC 7231 HTTP-date (`"Wed, 22 Oct 2025 12:00:00 GMT"`).
///
/// The weekday token is not cross-checked against the date. Returns `None`
/// when the value does not match.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let (_, rest) = value.trim().split_once(", ")?;
    NaiveDateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S GMT")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parses an OpenSSL-style certificate date (`"Oct 22 12:00:00 2025 GMT"`).
pub fn parse_certificate_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), "%b %d %H:%M:%S %Y GMT")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whole days from `now` until `target`, rounded towards negative infinity.
///
/// One second past expiry yields `-1`, not `0`.
pub fn calculate_days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (target - now).num_seconds().div_euclid(86_400)
}
