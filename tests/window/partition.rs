use insider_sync::window::{EARLIEST_MONTH, EARLIEST_YEAR, partition};
use insider_sync::{DateWindow, InsiderError};

use crate::common::date;

#[test]
fn months_up_to_yesterday() {
    let windows = partition(2026, false, date(2026, 3, 15)).unwrap();
    assert_eq!(windows, crate::common::q1_2026().to_vec());
}

#[test]
fn windows_are_ordered_and_bounded() {
    let today = date(2025, 7, 9);
    let windows = partition(2023, false, today).unwrap();

    // 2023 and 2024 in full, then January to July of 2025.
    assert_eq!(windows.len(), 12 + 12 + 7);
    for w in &windows {
        assert!(w.start <= w.end, "inverted window {w}");
        assert!(w.end < today, "window {w} reaches today");
    }
    for pair in windows.windows(2) {
        assert_eq!(pair[0].end.succ_opt().unwrap(), pair[1].start);
    }
    assert_eq!(windows.last().unwrap().end, date(2025, 7, 8));
}

#[test]
fn leap_february_ends_on_the_29th() {
    let windows = partition(2024, false, date(2024, 12, 31)).unwrap();
    assert_eq!(windows[1], DateWindow::new(date(2024, 2, 1), date(2024, 2, 29)));
    assert_eq!(windows[11], DateWindow::new(date(2024, 12, 1), date(2024, 12, 30)));
}

#[test]
fn first_of_month_skips_the_current_month() {
    let windows = partition(2026, false, date(2026, 3, 1)).unwrap();
    assert_eq!(windows.len(), 2);
    assert_eq!(windows.last().unwrap().end, date(2026, 2, 28));

    let none = partition(2026, false, date(2026, 1, 1)).unwrap();
    assert!(none.is_empty());
}

#[test]
fn earliest_year_starts_in_march() {
    let windows = partition(EARLIEST_YEAR, false, date(2013, 6, 20)).unwrap();
    assert_eq!(windows.first().unwrap().start, date(EARLIEST_YEAR, EARLIEST_MONTH, 1));
    assert_eq!(windows.len(), 4);
}

#[test]
fn future_start_year_is_rejected() {
    let err = partition(2027, false, date(2026, 3, 15)).unwrap_err();
    assert!(
        matches!(err, InsiderError::FutureStartYear { requested: 2027, current: 2026 }),
        "unexpected error: {err}"
    );
}

#[test]
fn start_year_before_coverage_is_rejected() {
    let err = partition(2012, false, date(2026, 3, 15)).unwrap_err();
    assert!(matches!(err, InsiderError::InvalidParams(_)), "unexpected error: {err}");
}

#[test]
fn fdr_uses_us_dates() {
    let w = DateWindow::new(date(2024, 10, 1), date(2024, 10, 31));
    assert_eq!(w.fdr(), "10/01/2024 - 10/31/2024");
}
