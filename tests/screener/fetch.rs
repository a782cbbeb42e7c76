use httpmock::Method::GET;
use insider_sync::screener::{ScreenerQuery, fetch_window};
use insider_sync::{DateWindow, InsiderError};

use crate::common::{client, date, fixture, setup_server};

#[tokio::test]
async fn sends_window_and_filters() {
    let server = setup_server();
    let window = DateWindow::new(date(2024, 10, 1), date(2024, 10, 31));

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/screener")
            .query_param("fd", "-7")
            .query_param("fdr", "10/01/2024 - 10/31/2024")
            .query_param("td", "0")
            .query_param("cnt", "250")
            .query_param("page", "1");
        then.status(200)
            .header("content-type", "text/html")
            .body(fixture("screener_page", "html"));
    });

    let query = ScreenerQuery {
        filing_days: 7,
        trade_date_filter: 0,
        max_rows: 250,
    };
    let rows = fetch_window(&client(&server), &query, window).await.unwrap();

    mock.assert();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn page_without_table_yields_no_rows() {
    let server = setup_server();
    let window = DateWindow::day(date(2026, 3, 15));

    let mock = server.mock(|when, then| {
        when.method(GET).path("/screener");
        then.status(200).body("<html><body>Maintenance</body></html>");
    });

    let rows = fetch_window(&client(&server), &ScreenerQuery::default(), window)
        .await
        .unwrap();

    mock.assert();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn server_error_is_surfaced() {
    let server = setup_server();
    let window = DateWindow::day(date(2026, 3, 15));

    let mock = crate::common::mock_window_status(&server, window, 503);

    let err = fetch_window(&client(&server), &ScreenerQuery::default(), window)
        .await
        .unwrap_err();

    mock.assert_hits(1);
    assert!(matches!(err, InsiderError::Status { status: 503, .. }), "{err}");
}

#[tokio::test]
async fn retries_transient_status() {
    use insider_sync::{Backoff, InsiderClient, RetryConfig};
    use std::time::Duration;

    let server = setup_server();
    let window = DateWindow::day(date(2026, 3, 15));
    let mock = crate::common::mock_window_status(&server, window, 502);

    let retrying = InsiderClient::builder()
        .base_url(crate::common::screener_url(&server))
        .retry_config(RetryConfig {
            max_retries: 2,
            backoff: Backoff::Fixed(Duration::from_millis(1)),
            ..RetryConfig::default()
        })
        .build()
        .unwrap();

    let err = fetch_window(&retrying, &ScreenerQuery::default(), window)
        .await
        .unwrap_err();

    mock.assert_hits(3);
    assert!(matches!(err, InsiderError::Status { status: 502, .. }));
}

#[tokio::test]
async fn deadline_is_reported_as_timeout() {
    use insider_sync::screener::fetch_window_within;
    use std::time::Duration;

    let server = setup_server();
    let window = DateWindow::day(date(2026, 3, 15));
    server.mock(|when, then| {
        when.method(GET).path("/screener");
        then.status(200)
            .delay(Duration::from_secs(2))
            .body(fixture("screener_page", "html"));
    });

    let limit = Duration::from_millis(200);
    let err = fetch_window_within(&client(&server), &ScreenerQuery::default(), window, limit)
        .await
        .unwrap_err();

    assert!(matches!(err, InsiderError::Timeout(d) if d == limit), "{err}");
}
