//! End-to-end runs against real `object_store` backends.

use common::config::{Configuration, StorageBackend};
use object_store::ObjectStore;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use rotator::{ObjectStoreBucket, RetentionPolicy, RotationMetrics, Rotator};
use std::sync::Arc;
use std::time::Duration;

async fn put(store: &Arc<dyn ObjectStore>, key: &str) {
    store
        .put(&ObjectPath::from(key), "tariff".into())
        .await
        .unwrap();
}

async fn exists(store: &Arc<dyn ObjectStore>, key: &str) -> bool {
    store.head(&ObjectPath::from(key)).await.is_ok()
}

fn config(prefixes: &[&str]) -> Configuration {
    Configuration {
        bucket: "tariff-files".to_string(),
        prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        name_filter: Some("electronic_tariff_file".to_string()),
        threshold_days: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_deletes_matching_objects_in_memory() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put(&store, "uk/reporting/electronic_tariff_file_2023-01-01").await;
    put(&store, "uk/reporting/other_report_2023-01-01").await;
    put(&store, "xi/reporting/electronic_tariff_file_2023-01-01").await;

    let config = config(&["uk/reporting/"]);
    let bucket = ObjectStoreBucket::new("tariff-files", store.clone(), Duration::from_secs(5));
    let rotator = Rotator::new(
        RetentionPolicy::from(&config),
        Arc::new(bucket),
        RotationMetrics::new(),
    );

    let report = rotator.run().await;

    assert!(report.is_success());
    assert_eq!(report.total_deleted(), 1);
    assert!(!exists(&store, "uk/reporting/electronic_tariff_file_2023-01-01").await);
    assert!(exists(&store, "uk/reporting/other_report_2023-01-01").await);
    assert!(exists(&store, "xi/reporting/electronic_tariff_file_2023-01-01").await);
}

#[tokio::test]
async fn test_fresh_objects_survive_default_threshold() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put(&store, "uk/reporting/electronic_tariff_file_today").await;

    let config = Configuration {
        threshold_days: 42,
        ..config(&["uk/reporting/"])
    };
    let bucket = ObjectStoreBucket::new("tariff-files", store.clone(), Duration::from_secs(5));
    let rotator = Rotator::new(
        RetentionPolicy::from(&config),
        Arc::new(bucket),
        RotationMetrics::new(),
    );

    let report = rotator.run().await;

    assert!(report.is_success());
    assert_eq!(report.total_candidates(), 0);
    assert!(exists(&store, "uk/reporting/electronic_tariff_file_today").await);
}

#[tokio::test]
async fn test_dry_run_leaves_objects_in_place() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put(&store, "uk/reporting/electronic_tariff_file_1").await;

    let config = Configuration {
        dry_run: true,
        ..config(&["uk/reporting/"])
    };
    let bucket = ObjectStoreBucket::new("tariff-files", store.clone(), Duration::from_secs(5));
    let rotator = Rotator::new(
        RetentionPolicy::from(&config),
        Arc::new(bucket),
        RotationMetrics::new(),
    );

    let report = rotator.run().await;

    assert!(report.is_success());
    assert_eq!(report.total_candidates(), 1);
    assert!(exists(&store, "uk/reporting/electronic_tariff_file_1").await);
}

#[tokio::test]
async fn test_local_filesystem_bucket_from_config() {
    let root = tempfile::TempDir::new().unwrap();
    let mut config = config(&["uk/reporting/", "xi/reporting/"]);
    config.storage.backend = StorageBackend::File;
    config.storage.root = root.path().to_string_lossy().to_string();

    let bucket_dir = root.path().join("tariff-files");
    for key in [
        "uk/reporting/electronic_tariff_file_1",
        "xi/reporting/electronic_tariff_file_1",
        "xi/reporting/keep.csv",
    ] {
        let path = bucket_dir.join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "tariff").unwrap();
    }

    let rotator = Rotator::from_config(&config, RotationMetrics::new()).unwrap();
    let report = rotator.run().await;

    assert!(report.is_success());
    assert_eq!(report.total_deleted(), 2);
    assert!(!bucket_dir.join("uk/reporting/electronic_tariff_file_1").exists());
    assert!(!bucket_dir.join("xi/reporting/electronic_tariff_file_1").exists());
    assert!(bucket_dir.join("xi/reporting/keep.csv").exists());
}
