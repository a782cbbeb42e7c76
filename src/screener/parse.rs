//! Extract raw rows from a screener results page.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::core::{COLUMN_COUNT, RawRow};

static RESULTS_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.tinytable > tbody").expect("static selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("static selector"));

/// Parse the results table out of a screener page.
///
/// Returns `None` when the page has no `table.tinytable` body at all (layout change,
/// error page, empty result). Rows without cells are skipped and rows with fewer than
/// 13 cells are dropped whole; surplus cells are ignored.
pub fn parse_rows(html: &str) -> Option<Vec<RawRow>> {
    let doc = Html::parse_document(html);
    let body = doc.select(&RESULTS_BODY).next()?;

    let mut out = Vec::new();
    for tr in child_elements(body, "tr") {
        let cells: Vec<ElementRef<'_>> = child_elements(tr, "td").collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() < COLUMN_COUNT {
            tracing::debug!(cells = cells.len(), "dropping short screener row");
            continue;
        }

        let row: RawRow = std::array::from_fn(|i| cell_text(cells[i]));
        out.push(row);
    }
    Some(out)
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    tag: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == tag)
}

/// The first hyperlink's text if the cell has one, else the whole cell's text.
fn cell_text(cell: ElementRef<'_>) -> String {
    let source = cell.select(&ANCHOR).next().unwrap_or(cell);
    collapse_whitespace(&source.text().collect::<String>())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
