use std::cmp::Ordering;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use super::TransactionStore;
use crate::core::{InsiderError, StoredTransaction, TransactionQuery, TransactionRecord};

/// Process-local store. Contents do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<StoredTransaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Query order: newest trade first, then newest filing, then id for stability.
pub(crate) fn newest_first(a: &StoredTransaction, b: &StoredTransaction) -> Ordering {
    b.record
        .trade_date
        .cmp(&a.record.trade_date)
        .then_with(|| b.record.filing_date.cmp(&a.record.filing_date))
        .then_with(|| a.id.cmp(&b.id))
}

impl TransactionStore for MemoryStore {
    fn insert_bulk(&self, records: Vec<TransactionRecord>) -> BoxFuture<'_, Result<usize, InsiderError>> {
        async move {
            let n = records.len();
            let mut rows = self.rows.write().await;
            rows.extend(records.into_iter().map(StoredTransaction::new));
            Ok(n)
        }
        .boxed()
    }

    fn delete_all(&self) -> BoxFuture<'_, Result<u64, InsiderError>> {
        async move {
            let mut rows = self.rows.write().await;
            let n = rows.len() as u64;
            rows.clear();
            Ok(n)
        }
        .boxed()
    }

    fn replace_all(
        &self,
        records: Vec<TransactionRecord>,
    ) -> BoxFuture<'_, Result<usize, InsiderError>> {
        async move {
            let fresh: Vec<StoredTransaction> =
                records.into_iter().map(StoredTransaction::new).collect();
            let n = fresh.len();
            *self.rows.write().await = fresh;
            Ok(n)
        }
        .boxed()
    }

    fn query<'a>(
        &'a self,
        q: &'a TransactionQuery,
    ) -> BoxFuture<'a, Result<Vec<StoredTransaction>, InsiderError>> {
        async move {
            q.validate()?;
            let rows = self.rows.read().await;
            let mut hits: Vec<StoredTransaction> = rows
                .iter()
                .filter(|r| q.matches(&r.record))
                .cloned()
                .collect();
            hits.sort_by(newest_first);
            Ok(hits
                .into_iter()
                .skip(q.offset as usize)
                .take(q.limit as usize)
                .collect())
        }
        .boxed()
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, InsiderError>> {
        async move { Ok(self.rows.read().await.len() as u64) }.boxed()
    }

    fn has_ticker<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, Result<bool, InsiderError>> {
        async move {
            Ok(self
                .rows
                .read()
                .await
                .iter()
                .any(|r| r.record.ticker.eq_ignore_ascii_case(ticker)))
        }
        .boxed()
    }
}
