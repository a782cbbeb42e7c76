use std::time::Duration;

use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum InsiderError {
    /// An error occurred during an HTTP request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The screener returned an unexpected or unsuccessful HTTP status code.
    #[error("Unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// Reading or writing the staging file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The staging file could not be encoded or decoded.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The transaction store reported an error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A scraped field could not be converted to its typed form.
    #[error("cannot parse {field} from `{value}`: {reason}")]
    Parse {
        /// Column the value came from.
        field: &'static str,
        /// The raw cell text.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Data was in an unexpected shape (e.g. a staging header mismatch).
    #[error("Data format unexpected: {0}")]
    Data(String),

    /// The caller supplied invalid parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A refresh was requested from a year that has not started yet.
    #[error("start year {requested} is after the current year {current}")]
    FutureStartYear {
        /// The year the caller asked for.
        requested: i32,
        /// The current calendar year.
        current: i32,
    },

    /// Configuration was missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The scrape produced nothing usable (every window failed).
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Another force refresh or daily sync currently holds the refresh guard.
    #[error("a refresh is already in progress")]
    RefreshInProgress,

    /// The caller exceeded its request budget.
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited {
        /// Time until the current window closes.
        retry_after: Duration,
    },

    /// A window fetch, including its retries, did not finish before its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A background task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for InsiderError {
    fn from(e: tokio::task::JoinError) -> Self {
        InsiderError::Join(e.to_string())
    }
}

impl InsiderError {
    pub(crate) fn parse(field: &'static str, value: &str, reason: impl ToString) -> Self {
        InsiderError::Parse {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
