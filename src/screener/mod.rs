//! Page fetching and row parsing for the insider screener.

mod parse;
mod record;

pub use parse::parse_rows;

use std::time::Duration;

use serde::Serialize;

use crate::core::{InsiderClient, InsiderError, PipelineConfig, RawRow, net};
use crate::window::DateWindow;

/// Fixed screener filters applied to every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenerQuery {
    /// Filing-day offset, sent as `fd=-N`.
    pub filing_days: u32,
    /// Trade-date filter, sent as `td`. `0` means all dates.
    pub trade_date_filter: u32,
    /// Row cap, sent as `cnt`.
    pub max_rows: u32,
}

impl Default for ScreenerQuery {
    fn default() -> Self {
        Self {
            filing_days: 1,
            trade_date_filter: 0,
            max_rows: 5000,
        }
    }
}

impl From<&PipelineConfig> for ScreenerQuery {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            filing_days: cfg.filing_days,
            trade_date_filter: cfg.trade_date_filter,
            max_rows: cfg.max_rows,
        }
    }
}

impl ScreenerQuery {
    /// The full request URL for one window.
    pub fn url_for(&self, client: &InsiderClient, window: &DateWindow) -> url::Url {
        let mut url = client.base_url().clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("fd", &format!("-{}", self.filing_days))
            .append_pair("fdr", &window.fdr())
            .append_pair("td", &self.trade_date_filter.to_string())
            .append_pair("cnt", &self.max_rows.to_string())
            .append_pair("page", "1");
        url
    }
}

/// Fetch one window and extract its raw rows.
///
/// # Errors
///
/// Transport failures and non-2xx statuses (after retries) are returned as errors so the
/// caller can isolate them. A successful page without the results table is *not* an
/// error: it is logged and yields no rows.
pub async fn fetch_window(
    client: &InsiderClient,
    query: &ScreenerQuery,
    window: DateWindow,
) -> Result<Vec<RawRow>, InsiderError> {
    let url = query.url_for(client, &window);
    tracing::debug!(%window, %url, "fetching screener window");

    let resp = client.send_with_retry(client.http().get(url.clone())).await?;
    let body = net::get_text(resp).await?;

    match parse_rows(&body) {
        Some(rows) => {
            tracing::debug!(%window, rows = rows.len(), "parsed screener window");
            Ok(rows)
        }
        None => {
            tracing::warn!(%window, %url, "results table missing; window yields no rows");
            Ok(Vec::new())
        }
    }
}

/// [`fetch_window`] under a deadline covering the request and all of its retries.
///
/// # Errors
///
/// [`InsiderError::Timeout`] if `limit` elapses first, otherwise as [`fetch_window`].
pub async fn fetch_window_within(
    client: &InsiderClient,
    query: &ScreenerQuery,
    window: DateWindow,
    limit: Duration,
) -> Result<Vec<RawRow>, InsiderError> {
    tokio::time::timeout(limit, fetch_window(client, query, window))
        .await
        .map_err(|_| InsiderError::Timeout(limit))?
}
