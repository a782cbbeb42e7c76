//! Splits a `[start_year, today]` span into month-sized fetch windows.
//!
//! The screener only accepts bounded date ranges and truncates results beyond its
//! row cap, so each query covers at most one calendar month.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::fmt;

use crate::core::InsiderError;

/// First year the screener has data for.
pub const EARLIEST_YEAR: i32 = 2013;
/// Coverage in [`EARLIEST_YEAR`] begins in this month.
pub const EARLIEST_MONTH: u32 = 3;

/// Date layout the screener expects in its `fdr` parameter.
const FDR_FORMAT: &str = "%m/%d/%Y";

/// An inclusive date range fetched as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A window covering a single day.
    pub fn day(d: NaiveDate) -> Self {
        Self { start: d, end: d }
    }

    /// The `fdr` query value, e.g. `10/01/2024 - 10/31/2024`.
    pub fn fdr(&self) -> String {
        format!(
            "{} - {}",
            self.start.format(FDR_FORMAT),
            self.end.format(FDR_FORMAT)
        )
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Produce the ordered list of windows to scrape.
///
/// * A `start_year` after `today`'s year is rejected before anything else.
/// * In daily-sync mode the result is exactly `[today, today]`, whatever `start_year` was.
/// * Otherwise every month from `start_year` up to the current month is covered. The current
///   month ends yesterday, and is skipped entirely on the 1st.
pub fn partition(
    start_year: i32,
    daily_sync: bool,
    today: NaiveDate,
) -> Result<Vec<DateWindow>, InsiderError> {
    let current_year = today.year();
    if start_year > current_year {
        return Err(InsiderError::FutureStartYear {
            requested: start_year,
            current: current_year,
        });
    }

    if daily_sync {
        return Ok(vec![DateWindow::day(today)]);
    }

    if start_year < EARLIEST_YEAR {
        return Err(InsiderError::InvalidParams(format!(
            "start year {start_year} predates the earliest supported year {EARLIEST_YEAR}"
        )));
    }

    let yesterday = today
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| InsiderError::InvalidParams(format!("no day before {today}")))?;

    let mut windows = Vec::new();
    for year in start_year..=current_year {
        let first_month = if year == EARLIEST_YEAR { EARLIEST_MONTH } else { 1 };
        let last_month = if year == current_year { today.month() } else { 12 };

        for month in first_month..=last_month {
            let start = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| InsiderError::InvalidParams(format!("bad month {year}-{month}")))?;

            let end = if year == current_year && month == today.month() {
                if yesterday < start {
                    continue;
                }
                yesterday
            } else {
                last_day_of_month(start)?
            };

            windows.push(DateWindow { start, end });
        }
    }

    Ok(windows)
}

fn last_day_of_month(first: NaiveDate) -> Result<NaiveDate, InsiderError> {
    let next = first
        .checked_add_months(chrono::Months::new(1))
        .ok_or_else(|| InsiderError::InvalidParams(format!("no month after {first}")))?;
    next.pred_opt()
        .ok_or_else(|| InsiderError::InvalidParams(format!("no day before {next}")))
}
