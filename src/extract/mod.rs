use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::core::{InsiderClient, InsiderError, PipelineConfig, RawRow};
use crate::screener::{ScreenerQuery, fetch_window, fetch_window_within};
use crate::window::{DateWindow, partition};

/// Rows gathered by a scrape, plus how many windows it took and how many failed.
///
/// Row order follows window *completion* order and is not meaningful.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub rows: Vec<RawRow>,
    pub windows_attempted: usize,
    pub windows_failed: usize,
}

impl Extraction {
    /// True when at least one window was attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.windows_attempted > 0 && self.windows_failed == self.windows_attempted
    }
}

/// A builder for scraping every window of a date span concurrently.
///
/// Windows are fetched on a bounded pool of tasks. A failing, timed-out or panicking
/// window is logged and counted; it never cancels its siblings.
pub struct ExtractBuilder {
    client: InsiderClient,
    query: ScreenerQuery,
    start_year: Option<i32>,
    daily_sync: bool,
    today: Option<NaiveDate>,
    max_workers: usize,
    window_timeout: Option<Duration>,
}

impl ExtractBuilder {
    /// Creates a new `ExtractBuilder` with default screener filters and a pool of 4 workers.
    #[must_use]
    pub fn new(client: &InsiderClient) -> Self {
        Self {
            client: client.clone(),
            query: ScreenerQuery::default(),
            start_year: None,
            daily_sync: false,
            today: None,
            max_workers: 4,
            window_timeout: None,
        }
    }

    /// Creates a builder whose filters and pool size come from configuration.
    ///
    /// The window deadline covers the client's whole retry budget at `request_timeout` per
    /// attempt, so a timed-out attempt can still be retried inside its window.
    #[must_use]
    pub fn from_config(client: &InsiderClient, cfg: &PipelineConfig) -> Self {
        Self::new(client)
            .query(ScreenerQuery::from(cfg))
            .max_workers(cfg.max_workers)
            .window_timeout(client.retry_config().budget(cfg.request_timeout))
    }

    /// Sets the fixed screener filters.
    #[must_use]
    pub const fn query(mut self, query: ScreenerQuery) -> Self {
        self.query = query;
        self
    }

    /// First year to scrape. Defaults to the current year.
    #[must_use]
    pub const fn start_year(mut self, year: i32) -> Self {
        self.start_year = Some(year);
        self
    }

    /// Fetch only today's window instead of whole months. (Default: `false`)
    #[must_use]
    pub const fn daily_sync(mut self, yes: bool) -> Self {
        self.daily_sync = yes;
        self
    }

    /// Pin "today" instead of reading the local clock.
    #[must_use]
    pub const fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Number of windows fetched at once. Values below 1 are treated as 1.
    #[must_use]
    pub const fn max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self
    }

    /// Upper bound on a single window, including retries.
    #[must_use]
    pub const fn window_timeout(mut self, dur: Duration) -> Self {
        self.window_timeout = Some(dur);
        self
    }

    /// The windows `run` would fetch, without fetching them.
    pub fn windows(&self) -> Result<Vec<DateWindow>, InsiderError> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        partition(
            self.start_year.unwrap_or_else(|| today.year()),
            self.daily_sync,
            today,
        )
    }

    /// Executes the scrape.
    ///
    /// # Errors
    ///
    /// Only partition validation fails the whole call (e.g. a future start year), and it
    /// does so before any request is made. Per-window failures are reported through
    /// [`Extraction::windows_failed`].
    pub async fn run(self) -> Result<Extraction, InsiderError> {
        let windows = self.windows()?;
        let attempted = windows.len();
        tracing::info!(
            windows = attempted,
            workers = self.max_workers,
            daily_sync = self.daily_sync,
            "starting extraction"
        );

        let permits = Arc::new(Semaphore::new(self.max_workers.max(1)));
        let mut tasks = JoinSet::new();

        for window in windows {
            let client = self.client.clone();
            let query = self.query;
            let permits = Arc::clone(&permits);
            let limit = self.window_timeout;

            tasks.spawn(async move {
                let result = fetch_bounded(&client, &query, window, permits, limit).await;
                (window, result)
            });
        }

        let mut out = Extraction {
            windows_attempted: attempted,
            ..Extraction::default()
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(rows))) => out.rows.extend(rows),
                Ok((window, Err(e))) => {
                    out.windows_failed += 1;
                    tracing::warn!(%window, error = %e, "window fetch failed; continuing");
                }
                Err(e) => {
                    out.windows_failed += 1;
                    tracing::warn!(error = %e, "window task aborted; continuing");
                }
            }
        }

        tracing::info!(
            rows = out.rows.len(),
            failed = out.windows_failed,
            attempted,
            "extraction finished"
        );
        Ok(out)
    }
}

/// Fetch one window once a pool permit is available, under an optional deadline.
async fn fetch_bounded(
    client: &InsiderClient,
    query: &ScreenerQuery,
    window: DateWindow,
    permits: Arc<Semaphore>,
    limit: Option<Duration>,
) -> Result<Vec<RawRow>, InsiderError> {
    let _permit = permits
        .acquire_owned()
        .await
        .map_err(|e| InsiderError::Join(e.to_string()))?;

    match limit {
        Some(d) => fetch_window_within(client, query, window, d).await,
        None => fetch_window(client, query, window).await,
    }
}
