use std::sync::Arc;

use insider_sync::staging::write_staging;
use insider_sync::{
    ImportMode, InsiderError, MemoryStore, RefreshController, RefreshMode, STAGING_HEADERS,
    TransactionStore,
};

use crate::common::{client, config, raw_row, setup_server};

#[tokio::test]
async fn reloads_staging_file_without_scraping() {
    let server = setup_server();
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&server, dir.path());

    write_staging(
        &cfg.output_file,
        &STAGING_HEADERS,
        &[raw_row("AAA", "2026-01-05"), raw_row("BBB", "2026-01-06")],
    )
    .unwrap();

    let store = Arc::new(MemoryStore::new());
    let controller = RefreshController::new(client(&server), cfg, Arc::clone(&store));

    let replaced = controller.import_staged(ImportMode::Replace).await.unwrap();
    assert_eq!(replaced.mode, RefreshMode::StagedReplace);
    assert_eq!(replaced.windows_attempted, 0);
    assert_eq!(replaced.rows_scraped, 2);
    assert_eq!(store.count().await.unwrap(), 2);

    let appended = controller.import_staged(ImportMode::Append).await.unwrap();
    assert_eq!(appended.mode, RefreshMode::StagedAppend);
    assert_eq!(store.count().await.unwrap(), 4);

    controller.import_staged(ImportMode::Replace).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn missing_staging_file_is_an_error() {
    let server = setup_server();
    let dir = tempfile::tempdir().unwrap();

    let store = Arc::new(MemoryStore::new());
    let controller =
        RefreshController::new(client(&server), config(&server, dir.path()), Arc::clone(&store));

    let err = controller.import_staged(ImportMode::Replace).await.unwrap_err();
    assert!(matches!(err, InsiderError::Csv(_) | InsiderError::Io(_)), "{err}");
    assert_eq!(store.count().await.unwrap(), 0);
}
