//! Sequencing of scrape, staging and load into one refresh operation.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::core::{InsiderClient, InsiderError, PipelineConfig, RawRow};
use crate::extract::{ExtractBuilder, Extraction};
use crate::staging::{ImportPolicy, LoadOutcome, load_records, read_staging, write_staging};
use crate::store::TransactionStore;
use crate::window::partition;

/// Which operation produced a [`RefreshSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    /// Full historical scrape replacing the store.
    ForceRefresh,
    /// Today's window appended to the store.
    DailySync,
    /// Existing staging file replacing the store.
    StagedReplace,
    /// Existing staging file appended to the store.
    StagedAppend,
}

/// Whether [`RefreshController::import_staged`] replaces or extends the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    #[default]
    Replace,
    Append,
}

/// Outcome of a refresh, including partial failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub mode: RefreshMode,
    pub windows_attempted: usize,
    pub windows_failed: usize,
    pub rows_scraped: usize,
    pub records_imported: usize,
    pub records_rejected: usize,
    pub staging_file: PathBuf,
}

/// Serializes refreshes. `busy` mirrors the lock so it can be observed without touching it.
#[derive(Debug, Default)]
struct RefreshGuard {
    lock: Mutex<()>,
    busy: AtomicBool,
}

/// Held for the duration of one refresh.
struct Running<'a> {
    _lock: MutexGuard<'a, ()>,
    busy: &'a AtomicBool,
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl RefreshGuard {
    fn acquire(&self) -> Result<Running<'_>, InsiderError> {
        let lock = self
            .lock
            .try_lock()
            .map_err(|_| InsiderError::RefreshInProgress)?;
        self.busy.store(true, Ordering::Release);
        Ok(Running {
            _lock: lock,
            busy: &self.busy,
        })
    }
}

/// Drives force refreshes and daily syncs against a [`TransactionStore`].
///
/// Clones share one refresh guard, so at most one refresh runs at a time across all of
/// them; a concurrent request fails with [`InsiderError::RefreshInProgress`].
pub struct RefreshController<S: ?Sized> {
    client: InsiderClient,
    config: PipelineConfig,
    store: Arc<S>,
    guard: Arc<RefreshGuard>,
    policy: ImportPolicy,
    today: Option<NaiveDate>,
}

impl<S: ?Sized> Clone for RefreshController<S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            store: Arc::clone(&self.store),
            guard: Arc::clone(&self.guard),
            policy: self.policy,
            today: self.today,
        }
    }
}

impl<S> RefreshController<S>
where
    S: TransactionStore + ?Sized,
{
    pub fn new(client: InsiderClient, config: PipelineConfig, store: Arc<S>) -> Self {
        Self {
            client,
            config,
            store,
            guard: Arc::new(RefreshGuard::default()),
            policy: ImportPolicy::default(),
            today: None,
        }
    }

    /// How invalid staged rows are handled. (Default: [`ImportPolicy::Strict`])
    #[must_use]
    pub fn import_policy(mut self, policy: ImportPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pin "today" instead of reading the local clock.
    #[must_use]
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether a refresh is currently running. Never contends with one starting.
    pub fn is_refreshing(&self) -> bool {
        self.guard.busy.load(Ordering::Acquire)
    }

    fn current_day(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Replace the store with a full scrape from `start_year` through yesterday.
    ///
    /// The store is only touched after extraction and staging succeed, and the swap is a
    /// single [`TransactionStore::replace_all`], so a failure leaves the previous data intact.
    ///
    /// # Errors
    ///
    /// * [`InsiderError::FutureStartYear`] before any request if `start_year` is in the future.
    /// * [`InsiderError::RefreshInProgress`] if another refresh is running.
    /// * [`InsiderError::Extraction`] if every window failed.
    /// * Staging, parse (under [`ImportPolicy::Strict`]) and store errors.
    #[tracing::instrument(skip(self), err)]
    pub async fn force_refresh(&self, start_year: i32) -> Result<RefreshSummary, InsiderError> {
        let today = self.current_day();
        partition(start_year, false, today)?;

        let _running = self.guard.acquire()?;

        tracing::info!(start_year, %today, "force refresh: extracting");
        let extraction = ExtractBuilder::from_config(&self.client, &self.config)
            .start_year(start_year)
            .today(today)
            .run()
            .await?;

        let (scraped, outcome) = self.stage_and_load(&extraction).await?;

        tracing::info!(records = outcome.records.len(), "force refresh: replacing store");
        let imported = self.store.replace_all(outcome.records).await?;

        Ok(self.summary(RefreshMode::ForceRefresh, &extraction, scraped, imported, outcome.rejected))
    }

    /// Append today's filings without clearing anything.
    ///
    /// Running this twice for the same day stores that day's rows twice: the store has no
    /// natural key to deduplicate on.
    #[tracing::instrument(skip(self), err)]
    pub async fn daily_sync(&self) -> Result<RefreshSummary, InsiderError> {
        let today = self.current_day();

        let _running = self.guard.acquire()?;

        tracing::info!(%today, "daily sync: extracting");
        let extraction = ExtractBuilder::from_config(&self.client, &self.config)
            .start_year(today.year())
            .daily_sync(true)
            .today(today)
            .run()
            .await?;

        let (scraped, outcome) = self.stage_and_load(&extraction).await?;

        tracing::info!(records = outcome.records.len(), "daily sync: appending");
        let imported = self.store.insert_bulk(outcome.records).await?;

        Ok(self.summary(RefreshMode::DailySync, &extraction, scraped, imported, outcome.rejected))
    }

    /// Load the existing staging file without scraping.
    #[tracing::instrument(skip(self), err)]
    pub async fn import_staged(&self, mode: ImportMode) -> Result<RefreshSummary, InsiderError> {
        let _running = self.guard.acquire()?;

        let path = self.config.output_file.clone();
        let headers = self.config.column_headers.clone();
        let policy = self.policy;
        let (staged, outcome) = tokio::task::spawn_blocking(move || {
            let rows = read_staging(&path, &headers)?;
            let outcome = load_records(&rows, policy)?;
            Ok::<_, InsiderError>((rows.len(), outcome))
        })
        .await??;

        let (mode, imported) = match mode {
            ImportMode::Replace => (
                RefreshMode::StagedReplace,
                self.store.replace_all(outcome.records).await?,
            ),
            ImportMode::Append => (
                RefreshMode::StagedAppend,
                self.store.insert_bulk(outcome.records).await?,
            ),
        };

        Ok(self.summary(mode, &Extraction::default(), staged, imported, outcome.rejected))
    }

    /// Write the scraped rows to the staging file, read them back and convert them.
    async fn stage_and_load(
        &self,
        extraction: &Extraction,
    ) -> Result<(usize, LoadOutcome), InsiderError> {
        if extraction.all_failed() {
            return Err(InsiderError::Extraction(format!(
                "all {} windows failed",
                extraction.windows_attempted
            )));
        }

        let rows: Vec<RawRow> = extraction.rows.clone();
        let scraped = rows.len();
        let path = self.config.output_file.clone();
        let headers = self.config.column_headers.clone();
        let policy = self.policy;

        let outcome = tokio::task::spawn_blocking(move || {
            write_staging(&path, &headers, &rows)?;
            let staged = read_staging(&path, &headers)?;
            load_records(&staged, policy)
        })
        .await??;

        Ok((scraped, outcome))
    }

    fn summary(
        &self,
        mode: RefreshMode,
        extraction: &Extraction,
        rows_scraped: usize,
        records_imported: usize,
        records_rejected: usize,
    ) -> RefreshSummary {
        let summary = RefreshSummary {
            mode,
            windows_attempted: extraction.windows_attempted,
            windows_failed: extraction.windows_failed,
            rows_scraped,
            records_imported,
            records_rejected,
            staging_file: self.config.output_file.clone(),
        };
        tracing::info!(?summary, "refresh complete");
        summary
    }
}
