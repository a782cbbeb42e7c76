use insider_sync::staging::load_records;
use insider_sync::{ImportPolicy, InsiderError};

use crate::common::raw_row;

#[test]
fn strict_aborts_on_first_bad_row() {
    let mut bad = raw_row("BAD", "2026-01-02");
    bad[9] = "lots".into();
    let rows = vec![raw_row("AAA", "2026-01-01"), bad, raw_row("CCC", "2026-01-03")];

    let err = load_records(&rows, ImportPolicy::Strict).unwrap_err();
    assert!(matches!(err, InsiderError::Parse { field: "qty", .. }), "{err}");
}

#[test]
fn skip_invalid_counts_rejections() {
    let mut bad = raw_row("BAD", "2026-01-02");
    bad[2] = "yesterday".into();
    let rows = vec![raw_row("AAA", "2026-01-01"), bad, raw_row("CCC", "2026-01-03")];

    let out = load_records(&rows, ImportPolicy::SkipInvalid).unwrap();
    assert_eq!(out.rejected, 1);
    let tickers: Vec<&str> = out.records.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, ["AAA", "CCC"]);
}

#[test]
fn default_policy_is_strict() {
    assert_eq!(ImportPolicy::default(), ImportPolicy::Strict);
}
