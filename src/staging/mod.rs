//! The staging file sitting between a scrape and the bulk load.
//!
//! Scraped rows are written verbatim to a CSV file, then read back and converted. A
//! failed load can be retried from the file without scraping again.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::core::{COLUMN_COUNT, InsiderError, RawRow, TransactionRecord};

/// What to do with a staged row that cannot be converted to a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ImportPolicy {
    /// Abort the whole import on the first invalid row.
    #[default]
    Strict,
    /// Skip invalid rows, counting them in [`LoadOutcome::rejected`].
    SkipInvalid,
}

/// Records converted from a staged batch.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub records: Vec<TransactionRecord>,
    pub rejected: usize,
}

/// Write `rows` under `headers`, creating parent directories and replacing any existing file.
pub fn write_staging<H: AsRef<str>>(
    path: &Path,
    headers: &[H],
    rows: &[RawRow],
) -> Result<(), InsiderError> {
    check_width(headers)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut w = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_path(path)?;
    w.write_record(headers.iter().map(AsRef::<str>::as_ref))?;
    for row in rows {
        w.write_record(row)?;
    }
    w.flush()?;

    tracing::info!(path = %path.display(), rows = rows.len(), "staging file written");
    Ok(())
}

/// Read a staging file back into raw rows.
///
/// # Errors
///
/// A header that differs from `headers` or a row of the wrong width is
/// [`InsiderError::Data`]; I/O and CSV decoding failures are surfaced as-is.
pub fn read_staging<H: AsRef<str>>(path: &Path, headers: &[H]) -> Result<Vec<RawRow>, InsiderError> {
    check_width(headers)?;
    let mut r = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let found = r.headers()?;
    let expected = headers.iter().map(AsRef::<str>::as_ref);
    if !found.iter().map(str::trim).eq(expected.map(str::trim)) {
        return Err(InsiderError::Data(format!(
            "staging header mismatch in {}: {:?}",
            path.display(),
            found
        )));
    }

    let mut rows = Vec::new();
    for (i, rec) in r.records().enumerate() {
        let rec = rec?;
        if rec.len() != COLUMN_COUNT {
            return Err(InsiderError::Data(format!(
                "staging line {} has {} columns, expected {COLUMN_COUNT}",
                i + 2,
                rec.len()
            )));
        }
        rows.push(std::array::from_fn(|c| rec[c].to_string()));
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "staging file read");
    Ok(rows)
}

/// Convert staged rows to records under the given policy.
pub fn load_records(rows: &[RawRow], policy: ImportPolicy) -> Result<LoadOutcome, InsiderError> {
    let mut out = LoadOutcome {
        records: Vec::with_capacity(rows.len()),
        rejected: 0,
    };

    for row in rows {
        match TransactionRecord::try_from(row) {
            Ok(rec) => out.records.push(rec),
            Err(e) if policy == ImportPolicy::SkipInvalid => {
                out.rejected += 1;
                tracing::warn!(error = %e, ticker = %row[3], "skipping invalid staged row");
            }
            Err(e) => return Err(e),
        }
    }

    if out.rejected > 0 {
        tracing::warn!(rejected = out.rejected, loaded = out.records.len(), "staged rows rejected");
    }
    Ok(out)
}

fn check_width<H: AsRef<str>>(headers: &[H]) -> Result<(), InsiderError> {
    if headers.len() == COLUMN_COUNT {
        Ok(())
    } else {
        Err(InsiderError::InvalidParams(format!(
            "staging header needs {COLUMN_COUNT} columns, got {}",
            headers.len()
        )))
    }
}
