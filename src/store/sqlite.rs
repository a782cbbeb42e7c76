use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::TransactionStore;
use crate::core::{
    InsiderError, StoredTransaction, TransactionQuery, TransactionRecord, XFlag,
};

/// SQLite bind-parameter budget per INSERT statement, in rows.
const INSERT_CHUNK: usize = 500;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS transactions (
    id            TEXT PRIMARY KEY NOT NULL,
    x             TEXT,
    filing_date   TEXT,
    trade_date    TEXT NOT NULL,
    ticker        TEXT NOT NULL,
    company_name  TEXT,
    insider_name  TEXT,
    insider_title TEXT,
    trade_type    TEXT,
    price         TEXT,
    qty           INTEGER,
    owned         INTEGER,
    delta_owned   TEXT,
    value         TEXT,
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_ticker ON transactions (ticker);
CREATE INDEX IF NOT EXISTS idx_transactions_trade_date ON transactions (trade_date);
";

const COLUMNS: &str = "id, x, filing_date, trade_date, ticker, company_name, insider_name, \
     insider_title, trade_type, price, qty, owned, delta_owned, value, created_at";

/// Transaction store backed by a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and ensure the schema exists.
    pub async fn connect(url: &str) -> Result<Self, InsiderError> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;
        Self::from_pool(pool).await
    }

    /// A private in-memory database, kept alive on a single pooled connection.
    pub async fn in_memory() -> Result<Self, InsiderError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if needed.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, InsiderError> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert_into(
        conn: &mut SqliteConnection,
        records: Vec<TransactionRecord>,
    ) -> Result<usize, InsiderError> {
        let rows: Vec<StoredTransaction> = records.into_iter().map(StoredTransaction::new).collect();
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<'_, Sqlite> =
                QueryBuilder::new(format!("INSERT INTO transactions ({COLUMNS}) "));
            qb.push_values(chunk, |mut b, row| {
                let r = &row.record;
                b.push_bind(row.id.to_string())
                    .push_bind(r.x_flag.map(|f| f.as_char().to_string()))
                    .push_bind(r.filing_date)
                    .push_bind(r.trade_date)
                    .push_bind(r.ticker.clone())
                    .push_bind(r.company_name.clone())
                    .push_bind(r.insider_name.clone())
                    .push_bind(r.insider_title.clone())
                    .push_bind(r.trade_type.clone())
                    .push_bind(r.price.map(|d| d.to_string()))
                    .push_bind(r.qty)
                    .push_bind(r.owned)
                    .push_bind(r.delta_owned.clone())
                    .push_bind(r.value.map(|d| d.to_string()))
                    .push_bind(row.created_at);
            });
            qb.build().execute(&mut *conn).await?;
        }
        Ok(rows.len())
    }
}

fn decimal_column(row: &SqliteRow, col: &'static str) -> Result<Option<Decimal>, InsiderError> {
    row.try_get::<Option<String>, _>(col)?
        .map(|s| Decimal::from_str(&s).map_err(|e| InsiderError::parse(col, &s, e)))
        .transpose()
}

fn decode_row(row: &SqliteRow) -> Result<StoredTransaction, InsiderError> {
    let id: String = row.try_get("id")?;
    let x: Option<String> = row.try_get("x")?;

    Ok(StoredTransaction {
        id: Uuid::parse_str(&id).map_err(|e| InsiderError::parse("id", &id, e))?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        record: TransactionRecord {
            x_flag: match x {
                Some(s) => XFlag::parse(&s)?,
                None => None,
            },
            filing_date: row.try_get::<Option<NaiveDateTime>, _>("filing_date")?,
            trade_date: row.try_get::<NaiveDate, _>("trade_date")?,
            ticker: row.try_get("ticker")?,
            company_name: row.try_get("company_name")?,
            insider_name: row.try_get("insider_name")?,
            insider_title: row.try_get("insider_title")?,
            trade_type: row.try_get("trade_type")?,
            price: decimal_column(row, "price")?,
            qty: row.try_get("qty")?,
            owned: row.try_get("owned")?,
            delta_owned: row.try_get("delta_owned")?,
            value: decimal_column(row, "value")?,
        },
    })
}

impl TransactionStore for SqliteStore {
    fn insert_bulk(&self, records: Vec<TransactionRecord>) -> BoxFuture<'_, Result<usize, InsiderError>> {
        async move {
            let mut tx = self.pool.begin().await?;
            let n = Self::insert_into(&mut tx, records).await?;
            tx.commit().await?;
            Ok(n)
        }
        .boxed()
    }

    fn delete_all(&self) -> BoxFuture<'_, Result<u64, InsiderError>> {
        async move {
            let done = sqlx::query("DELETE FROM transactions")
                .execute(&self.pool)
                .await?;
            Ok(done.rows_affected())
        }
        .boxed()
    }

    fn replace_all(
        &self,
        records: Vec<TransactionRecord>,
    ) -> BoxFuture<'_, Result<usize, InsiderError>> {
        async move {
            let mut tx = self.pool.begin().await?;
            let removed = sqlx::query("DELETE FROM transactions")
                .execute(&mut *tx)
                .await?
                .rows_affected();
            let n = Self::insert_into(&mut tx, records).await?;
            tx.commit().await?;
            tracing::info!(removed, inserted = n, "transactions replaced");
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
            let mut qb: QueryBuilder<'_, Sqlite> =
                QueryBuilder::new(format!("SELECT {COLUMNS} FROM transactions WHERE 1 = 1"));
            if let Some(t) = &q.ticker {
                qb.push(" AND ticker = ").push_bind(t.to_ascii_uppercase());
            }
            if let Some(d) = q.from_date {
                qb.push(" AND trade_date >= ").push_bind(d);
            }
            if let Some(d) = q.to_date {
                qb.push(" AND trade_date <= ").push_bind(d);
            }
            if let Some(tt) = q.trade_type {
                qb.push(" AND trade_type = ").push_bind(tt.as_str());
            }
            qb.push(" ORDER BY trade_date DESC, filing_date DESC, id ASC LIMIT ")
                .push_bind(i64::from(q.limit))
                .push(" OFFSET ")
                .push_bind(i64::from(q.offset));

            let rows = qb.build().fetch_all(&self.pool).await?;
            rows.iter().map(decode_row).collect()
        }
        .boxed()
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, InsiderError>> {
        async move {
            let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
                .fetch_one(&self.pool)
                .await?;
            Ok(u64::try_from(n).unwrap_or_default())
        }
        .boxed()
    }

    fn has_ticker<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, Result<bool, InsiderError>> {
        async move {
            let hit: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM transactions WHERE ticker = ? LIMIT 1")
                    .bind(ticker.to_ascii_uppercase())
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(hit.is_some())
        }
        .boxed()
    }
}
