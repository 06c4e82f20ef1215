// ==========================================
// Concurrent import tests
// ==========================================
// At most one active import job per wholesaler; different wholesalers
// never block each other; the lock releases on every exit path.
// ==========================================

mod test_helpers;

use framecraft_catalog::{logging, ApiError, ImportConfig, ImportMode, JobState};
use futures::future::join_all;
use std::time::Duration;
use test_helpers::*;

#[tokio::test]
async fn test_second_import_same_wholesaler_rejected() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    let (api, _inspect) = build_slow_api(
        &db_path,
        Duration::from_millis(150),
        Duration::from_millis(50),
        ImportConfig {
            batch_size: 2,
            ..Default::default()
        },
    );

    let file = csv_file(&generated_rows(10, 1.00));
    let handle = api
        .import(file.clone(), "w1", ImportMode::Append)
        .await
        .unwrap();

    // the first job is still validating/importing: reject immediately
    match api.import(file, "w1", ImportMode::Append).await {
        Err(ApiError::ImportInProgress(w)) => assert_eq!(w, "w1"),
        Err(other) => panic!("expected ImportInProgress, got {other:?}"),
        Ok(_) => panic!("second import for the same wholesaler was accepted"),
    }

    let report = handle.wait().await.unwrap();
    assert_eq!(report.final_state, JobState::Completed);
}

#[tokio::test]
async fn test_lock_released_after_completion() {
    let (_tmp, db_path) = create_test_db();
    let (api, repo) = build_api(&db_path);

    let file = csv_file(&generated_rows(3, 1.00));
    api.import_and_wait(file.clone(), "w1", ImportMode::Replace)
        .await
        .unwrap();

    // a follow-up import for the same wholesaler must be accepted
    let report = api
        .import_and_wait(file, "w1", ImportMode::Replace)
        .await
        .unwrap();
    assert_eq!(report.final_state, JobState::Completed);

    use framecraft_catalog::CatalogRepository;
    assert_eq!(repo.count_products("w1").await.unwrap(), 3);
}

#[tokio::test]
async fn test_lock_released_after_parse_failure() {
    let (_tmp, db_path) = create_test_db();
    let (api, _repo) = build_api(&db_path);

    // missing required columns: job fails during Validating
    let broken = b"Product Code\nA1\n".to_vec();
    let handle = api.import(broken, "w1", ImportMode::Append).await.unwrap();
    assert!(handle.wait().await.is_err());

    // lock must be free again
    let file = csv_file(&generated_rows(2, 1.00));
    assert!(api.import_and_wait(file, "w1", ImportMode::Append).await.is_ok());
}

#[tokio::test]
async fn test_different_wholesalers_run_concurrently() {
    let (_tmp, db_path) = create_test_db();
    let (api, inspect) = build_slow_api(
        &db_path,
        Duration::from_millis(20),
        Duration::from_millis(20),
        ImportConfig {
            batch_size: 2,
            ..Default::default()
        },
    );

    let file = csv_file(&generated_rows(6, 2.00));
    let handles = vec![
        api.import(file.clone(), "alpha", ImportMode::Replace)
            .await
            .unwrap(),
        api.import(file.clone(), "beta", ImportMode::Replace)
            .await
            .unwrap(),
        api.import(file, "gamma", ImportMode::Replace)
            .await
            .unwrap(),
    ];

    let reports = join_all(handles.into_iter().map(|h| h.wait())).await;
    for report in reports {
        let report = report.unwrap();
        assert_eq!(report.final_state, JobState::Completed);
        assert_eq!(report.inserted, 6);
    }

    use framecraft_catalog::CatalogRepository;
    for wholesaler in ["alpha", "beta", "gamma"] {
        assert_eq!(inspect.count_products(wholesaler).await.unwrap(), 6);
    }
}

#[tokio::test]
async fn test_clear_rejected_while_importing() {
    let (_tmp, db_path) = create_test_db();
    let (api, _inspect) = build_slow_api(
        &db_path,
        Duration::from_millis(150),
        Duration::from_millis(50),
        ImportConfig::default(),
    );

    let file = csv_file(&generated_rows(5, 1.00));
    let handle = api.import(file, "w1", ImportMode::Append).await.unwrap();

    assert!(matches!(
        api.clear_catalog("w1").await,
        Err(ApiError::ImportInProgress(_))
    ));

    handle.wait().await.unwrap();
    // and accepted once the job is done
    assert!(api.clear_catalog("w1").await.is_ok());
}
