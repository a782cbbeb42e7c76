use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::InsiderError;

/// Number of cells in a screener row and columns in the staging file.
pub const COLUMN_COUNT: usize = 13;

/// Staging header in column order. The misspelt "Filling Date" matches the files
/// produced by earlier versions of the pipeline.
pub const STAGING_HEADERS: [&str; COLUMN_COUNT] = [
    "X",
    "Filling Date",
    "Trade Date",
    "Ticker",
    "Company Name",
    "Insider Name",
    "Title",
    "Trade Type",
    "Price",
    "Qty",
    "Owned",
    "Delta_owned",
    "Value",
];

/// One screener row as 13 trimmed cell strings, in [`STAGING_HEADERS`] order.
pub type RawRow = [String; COLUMN_COUNT];

/// Filing annotation from the screener's `X` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XFlag {
    /// Multiple transactions in filing.
    #[serde(rename = "M")]
    Multiple,
    /// Derivative transaction in filing (usually option exercise).
    #[serde(rename = "D")]
    Derivative,
    /// Amended filing.
    #[serde(rename = "A")]
    Amended,
    /// Error detected in filing.
    #[serde(rename = "E")]
    Error,
}

impl XFlag {
    pub fn as_char(self) -> char {
        match self {
            XFlag::Multiple => 'M',
            XFlag::Derivative => 'D',
            XFlag::Amended => 'A',
            XFlag::Error => 'E',
        }
    }

    /// Parse the `X` cell. Blank is `None`; when several letters are present the first wins.
    pub fn parse(raw: &str) -> Result<Option<Self>, InsiderError> {
        let Some(c) = raw.chars().find(|c| !c.is_whitespace()) else {
            return Ok(None);
        };
        match c.to_ascii_uppercase() {
            'M' => Ok(Some(XFlag::Multiple)),
            'D' => Ok(Some(XFlag::Derivative)),
            'A' => Ok(Some(XFlag::Amended)),
            'E' => Ok(Some(XFlag::Error)),
            other => Err(InsiderError::parse(
                "x_flag",
                raw,
                format!("unknown flag `{other}`"),
            )),
        }
    }
}

/// Transaction kinds the query layer can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    #[serde(rename = "S - Sale")]
    Sale,
    #[serde(rename = "S - Sale+OE")]
    SaleOe,
    #[serde(rename = "P - Purchase")]
    Purchase,
}

impl TradeType {
    /// The code string as it appears in the screener's `Trade Type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            TradeType::Sale => "S - Sale",
            TradeType::SaleOe => "S - Sale+OE",
            TradeType::Purchase => "P - Purchase",
        }
    }
}

impl std::str::FromStr for TradeType {
    type Err = InsiderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "S - Sale" => Ok(TradeType::Sale),
            "S - Sale+OE" => Ok(TradeType::SaleOe),
            "P - Purchase" => Ok(TradeType::Purchase),
            other => Err(InsiderError::InvalidParams(format!(
                "unknown trade type `{other}`"
            ))),
        }
    }
}

/// A single insider transaction as scraped from the screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub x_flag: Option<XFlag>,
    pub filing_date: Option<NaiveDateTime>,
    pub trade_date: NaiveDate,
    pub ticker: String,
    pub company_name: Option<String>,
    pub insider_name: Option<String>,
    pub insider_title: Option<String>,
    /// Code string such as `"S - Sale"`; see [`TradeType`].
    pub trade_type: Option<String>,
    pub price: Option<Decimal>,
    /// Share count; negative for sales.
    pub qty: Option<i64>,
    /// Shares owned after the transaction.
    pub owned: Option<i64>,
    /// Ownership change as shown by the source (e.g. `"+5%"`, `"New"`).
    pub delta_owned: Option<String>,
    pub value: Option<Decimal>,
}

/// A record as persisted, with its generated identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: TransactionRecord,
}

impl StoredTransaction {
    /// Assign a fresh identity to a record at persistence time. Tickers are stored uppercased.
    pub fn new(mut record: TransactionRecord) -> Self {
        record.ticker.make_ascii_uppercase();
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            record,
        }
    }
}

/// Filter and page parameters for reading transactions back.
///
/// Results are always ordered by `trade_date` descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub ticker: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub trade_type: Option<TradeType>,
    pub offset: u32,
    pub limit: u32,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            ticker: None,
            from_date: None,
            to_date: None,
            trade_type: None,
            offset: 0,
            limit: 100,
        }
    }
}

impl TransactionQuery {
    #[must_use]
    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    #[must_use]
    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    #[must_use]
    pub fn trade_type(mut self, tt: TradeType) -> Self {
        self.trade_type = Some(tt);
        self
    }

    #[must_use]
    pub fn page(mut self, offset: u32, limit: u32) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Reject inverted date ranges before hitting a store.
    pub fn validate(&self) -> Result<(), InsiderError> {
        if let (Some(from), Some(to)) = (self.from_date, self.to_date)
            && from > to
        {
            return Err(InsiderError::InvalidParams(
                "from_date cannot be after to_date".into(),
            ));
        }
        Ok(())
    }

    /// In-memory predicate equivalent to the SQL filter.
    pub fn matches(&self, r: &TransactionRecord) -> bool {
        self.ticker
            .as_deref()
            .is_none_or(|t| r.ticker.eq_ignore_ascii_case(t))
            && self.from_date.is_none_or(|d| r.trade_date >= d)
            && self.to_date.is_none_or(|d| r.trade_date <= d)
            && self
                .trade_type
                .is_none_or(|tt| r.trade_type.as_deref() == Some(tt.as_str()))
    }
}
