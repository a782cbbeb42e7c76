use insider_sync::screener::parse_rows;

use crate::common::fixture;

#[test]
fn parses_fixture_rows() {
    let rows = parse_rows(&fixture("screener_page", "html")).expect("table present");

    // The truncated row and the empty row are dropped.
    assert_eq!(rows.len(), 3);

    let aapl = &rows[0];
    assert_eq!(aapl[0], "M");
    assert_eq!(aapl[1], "2024-10-18 16:05:23");
    assert_eq!(aapl[2], "2024-10-16");
    assert_eq!(aapl[3], "AAPL");
    assert_eq!(aapl[4], "Apple Inc.");
    assert_eq!(aapl[5], "Cook Timothy D");
    assert_eq!(aapl[8], "$233.85");
    assert_eq!(aapl[12], "-$11,692,500");
}

#[test]
fn empty_cells_and_whitespace() {
    let rows = parse_rows(&fixture("screener_page", "html")).unwrap();
    assert_eq!(rows[1][0], "");
    assert_eq!(rows[2][6], "Vice Chair, President");
}

#[test]
fn anchor_text_wins_over_cell_text() {
    let html = r#"<table class="tinytable"><tbody><tr>
        <td>M</td><td><a href="/f">2024-01-02 03:04:05</a> <span>extra</span></td>
        <td>2024-01-01</td><td><b><a href="/X">XYZ</a></b> (note)</td><td>Co</td>
        <td>Name</td><td>Dir</td><td>S - Sale</td><td>$1</td><td>-1</td>
        <td>1</td><td>0%</td><td>-$1</td>
    </tr></tbody></table>"#;

    let rows = parse_rows(html).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], "2024-01-02 03:04:05");
    assert_eq!(rows[0][3], "XYZ");
}

#[test]
fn missing_table_is_none() {
    assert!(parse_rows("<html><body><p>No results</p></body></html>").is_none());
    assert!(parse_rows(r#"<table class="other"><tbody><tr><td>x</td></tr></tbody></table>"#).is_none());
}

#[test]
fn surplus_cells_are_ignored() {
    let mut cells: Vec<String> = crate::common::raw_row("ABC", "2026-01-02").to_vec();
    cells.push("surplus".into());
    let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
    let html = format!(r#"<table class="tinytable"><tbody><tr>{tds}</tr></tbody></table>"#);

    let rows = parse_rows(&html).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][12], "-$10,500");
}
