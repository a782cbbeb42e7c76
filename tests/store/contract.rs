//! Behavior shared by every store backend, run against each of them.

use insider_sync::{
    InsiderError, MemoryStore, SqliteStore, TradeType, TransactionQuery, TransactionRecord,
    TransactionStore,
};

use crate::common::{date, raw_row};

fn record(ticker: &str, trade: &str, filed: &str, trade_type: &str) -> TransactionRecord {
    let mut row = raw_row(ticker, trade);
    row[1] = filed.to_string();
    row[7] = trade_type.to_string();
    TransactionRecord::try_from(&row).unwrap()
}

fn sample() -> Vec<TransactionRecord> {
    vec![
        record("AAPL", "2026-01-05", "2026-01-06 10:00:00", "S - Sale"),
        record("MSFT", "2026-02-10", "2026-02-11 09:00:00", "P - Purchase"),
        record("AAPL", "2026-02-10", "2026-02-12 18:00:00", "S - Sale+OE"),
        record("TSLA", "2026-03-01", "2026-03-02 08:30:00", "S - Sale"),
        record("aapl", "2026-03-03", "2026-03-04 12:00:00", "P - Purchase"),
    ]
}

async fn insert_and_count(store: &dyn TransactionStore) {
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(store.insert_bulk(sample()).await.unwrap(), 5);
    assert_eq!(store.count().await.unwrap(), 5);

    // No natural key: the same batch twice is ten rows.
    store.insert_bulk(sample()).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 10);
}

async fn ordering(store: &dyn TransactionStore) {
    store.insert_bulk(sample()).await.unwrap();
    let rows = store.query(&TransactionQuery::default()).await.unwrap();

    let dates: Vec<_> = rows.iter().map(|r| r.record.trade_date).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);

    // Same trade date: later filing first.
    let same_day: Vec<&str> = rows
        .iter()
        .filter(|r| r.record.trade_date == date(2026, 2, 10))
        .map(|r| r.record.ticker.as_str())
        .collect();
    assert_eq!(same_day, ["AAPL", "MSFT"]);
    assert_eq!(rows[0].record.ticker, "AAPL");
    assert_eq!(rows[1].record.ticker, "TSLA");
}

async fn filters(store: &dyn TransactionStore) {
    store.insert_bulk(sample()).await.unwrap();

    let aapl = store.query(&TransactionQuery::default().ticker("aapl")).await.unwrap();
    assert_eq!(aapl.len(), 3);
    assert!(aapl.iter().all(|r| r.record.ticker == "AAPL"));

    let feb = store
        .query(&TransactionQuery::default().between(Some(date(2026, 2, 1)), Some(date(2026, 2, 28))))
        .await
        .unwrap();
    assert_eq!(feb.len(), 2);

    let buys = store
        .query(&TransactionQuery::default().trade_type(TradeType::Purchase))
        .await
        .unwrap();
    assert_eq!(buys.len(), 2);

    let since = store
        .query(&TransactionQuery::default().between(Some(date(2026, 3, 1)), None))
        .await
        .unwrap();
    assert_eq!(since.len(), 2);

    assert!(store.has_ticker("tsla").await.unwrap());
    assert!(!store.has_ticker("NVDA").await.unwrap());
}

async fn paging(store: &dyn TransactionStore) {
    store.insert_bulk(sample()).await.unwrap();
    let all = store.query(&TransactionQuery::default()).await.unwrap();

    let first = store.query(&TransactionQuery::default().page(0, 2)).await.unwrap();
    let second = store.query(&TransactionQuery::default().page(2, 2)).await.unwrap();
    let tail = store.query(&TransactionQuery::default().page(4, 2)).await.unwrap();

    assert_eq!(first, all[0..2]);
    assert_eq!(second, all[2..4]);
    assert_eq!(tail, all[4..]);
}

async fn inverted_range(store: &dyn TransactionStore) {
    let q = TransactionQuery::default().between(Some(date(2026, 3, 1)), Some(date(2026, 2, 1)));
    let err = store.query(&q).await.unwrap_err();
    assert!(matches!(err, InsiderError::InvalidParams(_)), "{err}");
}

async fn replace_and_delete(store: &dyn TransactionStore) {
    store.insert_bulk(sample()).await.unwrap();
    let fresh = vec![record("NVDA", "2026-03-05", "2026-03-06 10:00:00", "S - Sale")];

    assert_eq!(store.replace_all(fresh).await.unwrap(), 1);
    assert_eq!(store.count().await.unwrap(), 1);
    assert!(store.has_ticker("NVDA").await.unwrap());
    assert!(!store.has_ticker("AAPL").await.unwrap());

    assert_eq!(store.delete_all().await.unwrap(), 1);
    assert_eq!(store.count().await.unwrap(), 0);
}

async fn round_trips_fields(store: &dyn TransactionStore) {
    let rec = sample().remove(0);
    store.insert_bulk(vec![rec.clone()]).await.unwrap();
    let got = store.query(&TransactionQuery::default()).await.unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].record, rec);
}

async fn ticker_case_is_normalized(store: &dyn TransactionStore) {
    let mut rec = record("ABC", "2026-01-05", "2026-01-06 10:00:00", "S - Sale");
    rec.ticker = "abc".to_string();
    store.insert_bulk(vec![rec]).await.unwrap();

    assert!(store.has_ticker("abc").await.unwrap());
    assert!(store.has_ticker("ABC").await.unwrap());

    let hits = store.query(&TransactionQuery::default().ticker("Abc")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.ticker, "ABC");
}

macro_rules! backend_tests {
    ($module:ident, $make:expr) => {
        mod $module {
            use super::*;

            #[tokio::test]
            async fn insert_and_count() { super::insert_and_count(&$make).await }
            #[tokio::test]
            async fn ordering() { super::ordering(&$make).await }
            #[tokio::test]
            async fn filters() { super::filters(&$make).await }
            #[tokio::test]
            async fn paging() { super::paging(&$make).await }
            #[tokio::test]
            async fn inverted_range() { super::inverted_range(&$make).await }
            #[tokio::test]
            async fn replace_and_delete() { super::replace_and_delete(&$make).await }
            #[tokio::test]
            async fn round_trips_fields() { super::round_trips_fields(&$make).await }
            #[tokio::test]
            async fn ticker_case_is_normalized() { super::ticker_case_is_normalized(&$make).await }
        }
    };
}

backend_tests!(memory, MemoryStore::new());
backend_tests!(sqlite, SqliteStore::in_memory().await.unwrap());
