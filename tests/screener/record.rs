use std::str::FromStr;

use chrono::NaiveDateTime;
use insider_sync::screener::parse_rows;
use insider_sync::{InsiderError, RawRow, TransactionRecord, XFlag};
use rust_decimal::Decimal;

use crate::common::{date, fixture, raw_row};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn converts_fixture_rows() {
    let rows = parse_rows(&fixture("screener_page", "html")).unwrap();
    let records: Vec<TransactionRecord> = rows
        .iter()
        .map(|r| TransactionRecord::try_from(r).unwrap())
        .collect();

    let aapl = &records[0];
    assert_eq!(aapl.x_flag, Some(XFlag::Multiple));
    assert_eq!(
        aapl.filing_date,
        Some(NaiveDateTime::parse_from_str("2024-10-18 16:05:23", "%Y-%m-%d %H:%M:%S").unwrap())
    );
    assert_eq!(aapl.trade_date, date(2024, 10, 16));
    assert_eq!(aapl.price, Some(dec("233.85")));
    assert_eq!(aapl.qty, Some(-50_000));
    assert_eq!(aapl.owned, Some(3_280_180));
    assert_eq!(aapl.delta_owned.as_deref(), Some("-2%"));
    assert_eq!(aapl.value, Some(dec("-11692500")));

    let nvda = &records[1];
    assert_eq!(nvda.x_flag, None);
    assert_eq!(nvda.ticker, "NVDA");
    assert_eq!(nvda.insider_title.as_deref(), Some("Pres, CEO, 10%"));
    assert_eq!(nvda.trade_type.as_deref(), Some("P - Purchase"));
    assert_eq!(nvda.qty, Some(1_000));
    assert_eq!(nvda.value, Some(dec("120100")));

    assert_eq!(records[2].x_flag, Some(XFlag::Derivative));
}

#[test]
fn blank_numeric_cells_are_none() {
    let mut row: RawRow = raw_row("ABC", "2026-01-02");
    row[8] = String::new();
    row[9] = " ".into();
    row[12] = String::new();

    let rec = TransactionRecord::try_from(&row).unwrap();
    assert_eq!(rec.price, None);
    assert_eq!(rec.qty, None);
    assert_eq!(rec.value, None);
}

#[test]
fn missing_trade_date_is_an_error() {
    let mut row = raw_row("ABC", "");
    let err = TransactionRecord::try_from(&row).unwrap_err();
    assert!(matches!(err, InsiderError::Parse { field: "trade_date", .. }), "{err}");

    row[2] = "10/16/2024".into();
    let err = TransactionRecord::try_from(&row).unwrap_err();
    assert!(matches!(err, InsiderError::Parse { field: "trade_date", .. }), "{err}");
}

#[test]
fn malformed_price_is_an_error() {
    let mut row = raw_row("ABC", "2026-01-02");
    row[8] = "$12.3.4".into();
    let err = TransactionRecord::try_from(&row).unwrap_err();
    assert!(matches!(err, InsiderError::Parse { field: "price", .. }), "{err}");
}

#[test]
fn missing_ticker_is_an_error() {
    let row = raw_row("  ", "2026-01-02");
    let err = TransactionRecord::try_from(&row).unwrap_err();
    assert!(matches!(err, InsiderError::Parse { field: "ticker", .. }), "{err}");
}

#[test]
fn unknown_x_flag_is_an_error() {
    let mut row = raw_row("ABC", "2026-01-02");
    row[0] = "Q".into();
    assert!(TransactionRecord::try_from(&row).is_err());

    row[0] = "DM".into();
    let rec = TransactionRecord::try_from(&row).unwrap();
    assert_eq!(rec.x_flag, Some(XFlag::Derivative));
}
