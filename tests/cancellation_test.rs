// ==========================================
// Cancellation and progress tests
// ==========================================
// Cancellation is cooperative (between batches). Requested before any
// batch commits it leaves the catalog untouched; requested later in
// append/update it only stops further batches. Progress is a monotone
// fraction published through a watch channel.
// ==========================================

mod test_helpers;

use framecraft_catalog::{logging, CatalogRepository, ImportConfig, ImportMode, JobState};
use std::time::Duration;
use test_helpers::*;

#[tokio::test]
async fn test_cancel_before_first_batch_no_side_effects() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    // long validation read: the cancel lands before the executor writes
    let (api, inspect) = build_slow_api(
        &db_path,
        Duration::from_millis(300),
        Duration::from_millis(50),
        ImportConfig {
            batch_size: 2,
            ..Default::default()
        },
    );

    let file = csv_file(&generated_rows(10, 1.00));
    let handle = api.import(file, "w1", ImportMode::Append).await.unwrap();
    handle.cancel();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.final_state, JobState::Cancelled);
    assert_eq!(report.batches_committed, 0);
    assert_eq!(report.inserted, 0);
    assert_eq!(inspect.count_products("w1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_cancel_replace_leaves_old_catalog() {
    let (_tmp, db_path) = create_test_db();
    let (api, inspect) = build_slow_api(
        &db_path,
        Duration::from_millis(10),
        Duration::from_millis(150),
        ImportConfig {
            batch_size: 1,
            ..Default::default()
        },
    );

    // seed via the plain path
    let (seed_api, _) = build_api(&db_path);
    seed_api
        .import_and_wait(csv_file(&generated_rows(3, 5.00)), "w1", ImportMode::Replace)
        .await
        .unwrap();
    assert_eq!(inspect.count_products("w1").await.unwrap(), 3);

    // replace with 10 slow batches, cancel mid-staging
    let rows: Vec<String> = (0..10)
        .map(|i| row(&format!("NEW-{i}"), "Replacement", "frame", "1.00"))
        .collect();
    let handle = api
        .import(csv_file(&rows), "w1", ImportMode::Replace)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.cancel();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.final_state, JobState::Cancelled);
    // the swap never ran: the old catalog is fully intact
    let catalog = inspect.fetch_catalog("w1").await.unwrap();
    assert_eq!(catalog.len(), 3);
    assert!(catalog.iter().all(|r| r.product_code.starts_with("P-")));
}

#[tokio::test]
async fn test_cancel_append_keeps_committed_batches() {
    let (_tmp, db_path) = create_test_db();
    let (api, inspect) = build_slow_api(
        &db_path,
        Duration::from_millis(10),
        Duration::from_millis(120),
        ImportConfig {
            batch_size: 2,
            ..Default::default()
        },
    );

    let file = csv_file(&generated_rows(12, 1.00));
    let handle = api.import(file, "w1", ImportMode::Append).await.unwrap();
    // let a couple of batches commit, then cancel
    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.cancel();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.final_state, JobState::Cancelled);
    assert!(report.batches_committed >= 1);
    assert!(report.batches_committed < 6);

    // committed batches stay committed; nothing beyond them landed
    let count = inspect.count_products("w1").await.unwrap();
    assert_eq!(count, report.batches_committed * 2);
}

#[tokio::test]
async fn test_progress_is_monotone_and_completes() {
    let (_tmp, db_path) = create_test_db();
    let (api, _repo) = build_api_with_config(
        &db_path,
        ImportConfig {
            batch_size: 2,
            ..Default::default()
        },
    );

    let file = csv_file(&generated_rows(10, 1.00));
    let handle = api.import(file, "w1", ImportMode::Append).await.unwrap();

    let mut progress = handle.progress.clone();
    let watcher = tokio::spawn(async move {
        let mut fractions = vec![progress.borrow().fraction];
        while progress.changed().await.is_ok() {
            fractions.push(progress.borrow().fraction);
        }
        fractions
    });

    let report = handle.wait().await.unwrap();
    assert_eq!(report.final_state, JobState::Completed);

    let fractions = watcher.await.unwrap();
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {fractions:?}");
    assert_eq!(*fractions.last().unwrap(), 1.0);
}

#[tokio::test]
async fn test_progress_states_follow_job_lifecycle() {
    let (_tmp, db_path) = create_test_db();
    let (api, _repo) = build_api(&db_path);

    let file = csv_file(&generated_rows(4, 1.00));
    let handle = api.import(file, "w1", ImportMode::Replace).await.unwrap();

    let mut progress = handle.progress.clone();
    let watcher = tokio::spawn(async move {
        let mut states = vec![progress.borrow().state];
        while progress.changed().await.is_ok() {
            states.push(progress.borrow().state);
        }
        states
    });

    handle.wait().await.unwrap();
    let states = watcher.await.unwrap();

    // watch drops intermediate values under load, but whatever was seen
    // must be in lifecycle order and end Completed
    let order = |s: JobState| match s {
        JobState::Idle => 0,
        JobState::Validating => 1,
        JobState::Validated => 2,
        JobState::Importing => 3,
        JobState::Completed | JobState::Failed | JobState::Cancelled => 4,
    };
    assert!(states.windows(2).all(|w| order(w[0]) <= order(w[1])));
    assert_eq!(*states.last().unwrap(), JobState::Completed);
}
