//! insider-sync: keeps a store of insider-trading transactions in sync with an HTML screener.
//!
//! A refresh partitions a date span into [`window::DateWindow`]s, scrapes them concurrently
//! ([`extract`]), writes the rows to a CSV staging file ([`staging`]), converts them to
//! [`TransactionRecord`]s and loads them into a [`store::TransactionStore`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use insider_sync::{InsiderClient, PipelineConfig, RefreshController, SqliteStore};
//!
//! # async fn demo() -> Result<(), insider_sync::InsiderError> {
//! let config = PipelineConfig::from_env()?;
//! let client = InsiderClient::from_config(&config)?;
//! let store = Arc::new(SqliteStore::connect(&config.database_url).await?);
//!
//! let summary = RefreshController::new(client, config, store)
//!     .force_refresh(2024)
//!     .await?;
//! println!("{} records loaded", summary.records_imported);
//! # Ok(())
//! # }
//! ```

pub mod core;

pub mod extract;
pub mod ratelimit;
pub mod refresh;
pub mod schedule;
pub mod screener;
pub mod staging;
pub mod store;
pub mod window;

pub use crate::core::client::{Backoff, InsiderClient, InsiderClientBuilder, RetryConfig};
pub use crate::core::config::PipelineConfig;
pub use crate::core::error::InsiderError;
pub use crate::core::models::{
    COLUMN_COUNT, RawRow, STAGING_HEADERS, StoredTransaction, TradeType, TransactionQuery,
    TransactionRecord, XFlag,
};

pub use extract::{ExtractBuilder, Extraction};
pub use ratelimit::{FixedWindowLimiter, RateLimitPolicy, RateLimiter, Role, SlidingLogLimiter};
pub use refresh::{ImportMode, RefreshController, RefreshMode, RefreshSummary};
pub use schedule::DailySchedule;
pub use screener::ScreenerQuery;
pub use staging::{ImportPolicy, LoadOutcome};
pub use store::{MemoryStore, SqliteStore, TransactionStore};
pub use window::DateWindow;
