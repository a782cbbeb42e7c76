//! Environment-sourced pipeline configuration.
//!
//! Everything the scrape needs is resolved once, up front. A missing or malformed
//! required variable fails here, before any window is fetched.

use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use url::Url;

use crate::core::InsiderError;
use crate::core::models::COLUMN_COUNT;

/// Fully resolved settings for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Screener endpoint (`BASE_URL`).
    pub base_url: Url,
    /// Filing-day offset sent as `fd=-N` (`DEFAULT_FILLING_DAYS`).
    pub filing_days: u32,
    /// Trade-date filter sent as `td` (`TRADE_DATE_FILTER`).
    pub trade_date_filter: u32,
    /// Worker pool size (`MAX_WORKERS`).
    pub max_workers: usize,
    /// Staging CSV location (`OUTPUT_FILE`).
    pub output_file: PathBuf,
    /// Row cap per page sent as `cnt` (`MAX_ROWS`).
    pub max_rows: u32,
    /// Staging header, exactly 13 names (`COLUMN_HEADERS`).
    pub column_headers: Vec<String>,
    /// Per-request timeout (`REQUEST_TIMEOUT_SECS`).
    pub request_timeout: Duration,
    /// Local hour the daily sync fires at (`DAILY_SYNC_HOUR`).
    pub daily_sync_hour: u32,
    /// How late a daily sync may still start (`MISFIRE_GRACE_TIME`).
    pub misfire_grace: Duration,
    /// Store location (`DATABASE_URL`).
    pub database_url: String,
}

impl PipelineConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, InsiderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Used by [`from_env`](Self::from_env) and tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InsiderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = Url::parse(&required(&lookup, "BASE_URL")?)
            .map_err(|e| InsiderError::Config(format!("BASE_URL: {e}")))?;

        let max_workers: usize = parse_required(&lookup, "MAX_WORKERS")?;
        if max_workers == 0 {
            return Err(InsiderError::Config("MAX_WORKERS must be at least 1".into()));
        }

        let column_headers = split_headers(&required(&lookup, "COLUMN_HEADERS")?);
        if column_headers.len() != COLUMN_COUNT {
            return Err(InsiderError::Config(format!(
                "COLUMN_HEADERS must list {COLUMN_COUNT} names, got {}",
                column_headers.len()
            )));
        }

        let daily_sync_hour: u32 = parse_optional(&lookup, "DAILY_SYNC_HOUR", 20)?;
        if daily_sync_hour > 23 {
            return Err(InsiderError::Config(format!(
                "DAILY_SYNC_HOUR must be 0-23, got {daily_sync_hour}"
            )));
        }

        Ok(Self {
            base_url,
            filing_days: parse_required(&lookup, "DEFAULT_FILLING_DAYS")?,
            trade_date_filter: parse_required(&lookup, "TRADE_DATE_FILTER")?,
            max_workers,
            output_file: PathBuf::from(required(&lookup, "OUTPUT_FILE")?),
            max_rows: parse_required(&lookup, "MAX_ROWS")?,
            column_headers,
            request_timeout: Duration::from_secs(parse_optional(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                30,
            )?),
            daily_sync_hour,
            misfire_grace: Duration::from_secs(parse_optional(
                &lookup,
                "MISFIRE_GRACE_TIME",
                3600,
            )?),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://insider.db".to_string()),
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, InsiderError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| InsiderError::Config(format!("{key} is not set")))
}

fn parse_required<F, T>(lookup: &F, key: &str) -> Result<T, InsiderError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = required(lookup, key)?;
    raw.parse()
        .map_err(|e| InsiderError::Config(format!("invalid {key} value `{raw}`: {e}")))
}

fn parse_optional<F, T>(lookup: &F, key: &str, default: T) -> Result<T, InsiderError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|e| InsiderError::Config(format!("invalid {key} value `{raw}`: {e}"))),
        None => {
            tracing::debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn split_headers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|h| {
            h.trim()
                .trim_matches(|c| matches!(c, '\'' | '"' | '[' | ']'))
                .trim()
                .to_string()
        })
        .filter(|h| !h.is_empty())
        .collect()
}
