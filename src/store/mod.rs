//! Persistence for loaded transactions.
//!
//! [`TransactionStore`] is the seam the refresh controller writes through. Two
//! implementations ship: [`MemoryStore`] and the SQLite-backed [`SqliteStore`].

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use futures::future::BoxFuture;

use crate::core::{InsiderError, StoredTransaction, TransactionQuery, TransactionRecord};

/// A relational-style store of insider transactions.
///
/// No natural key is enforced: inserting the same record twice stores two rows.
pub trait TransactionStore: Send + Sync {
    /// Append records, assigning each a fresh id. Returns the number inserted.
    fn insert_bulk(&self, records: Vec<TransactionRecord>) -> BoxFuture<'_, Result<usize, InsiderError>>;

    /// Remove every record. Returns the number removed.
    fn delete_all(&self) -> BoxFuture<'_, Result<u64, InsiderError>>;

    /// Atomically swap the whole contents for `records`.
    ///
    /// Readers observe either the old or the new contents; a failure leaves the old ones.
    fn replace_all(&self, records: Vec<TransactionRecord>)
    -> BoxFuture<'_, Result<usize, InsiderError>>;

    /// Filtered, paged read ordered by `trade_date` descending.
    fn query<'a>(
        &'a self,
        q: &'a TransactionQuery,
    ) -> BoxFuture<'a, Result<Vec<StoredTransaction>, InsiderError>>;

    /// Total number of stored records.
    fn count(&self) -> BoxFuture<'_, Result<u64, InsiderError>>;

    /// Whether any record exists for `ticker` (case-insensitive).
    fn has_ticker<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, Result<bool, InsiderError>>;
}
