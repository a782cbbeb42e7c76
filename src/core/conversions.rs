//! Typed conversions for screener cell text.
//!
//! Every parser maps an empty cell (after stripping formatting) to `Ok(None)` and a
//! malformed one to [`InsiderError::Parse`]. Nothing ever defaults to zero.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::core::InsiderError;

/// Timestamp layout of the `Filling Date` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Date layout of the `Trade Date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Remove currency and thousands formatting plus an explicit `+` sign.
fn strip_numeric(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    match cleaned.strip_prefix('+') {
        Some(rest) => rest.to_string(),
        None => cleaned,
    }
}

/// `"$1,234.56"` → `1234.56`, `"-$12"` → `-12`, `""` → `None`.
pub fn parse_currency(field: &'static str, raw: &str) -> Result<Option<Decimal>, InsiderError> {
    let s = strip_numeric(raw);
    if s.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(&s)
        .map(Some)
        .map_err(|e| InsiderError::parse(field, raw, e))
}

/// `"1,000"` → `1000`, `"-5,000"` → `-5000`, `""` → `None`.
pub fn parse_int(field: &'static str, raw: &str) -> Result<Option<i64>, InsiderError> {
    let s = strip_numeric(raw);
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<i64>()
        .map(Some)
        .map_err(|e| InsiderError::parse(field, raw, e))
}

/// `"2024-10-18 16:05:23"` → timestamp, `""` → `None`.
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<Option<NaiveDateTime>, InsiderError> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(Some)
        .map_err(|e| InsiderError::parse(field, raw, e))
}

/// `"2024-10-16"` → date, `""` → `None`.
pub fn parse_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, InsiderError> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(Some)
        .map_err(|e| InsiderError::parse(field, raw, e))
}

/// Trimmed text, with empty mapped to `None`.
pub fn non_empty(raw: &str) -> Option<String> {
    let s = raw.trim();
    (!s.is_empty()).then(|| s.to_string())
}
