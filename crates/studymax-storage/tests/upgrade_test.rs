use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use studymax_core::TaskRecord;
use studymax_core::collections::{DOCUMENTS, TASKS};
use studymax_storage::{
    CollectionSchema, ConnectionManager, DefineCollections, ErrorKind, ForeignRefPolicy,
    IndexSpec, OpenRequest, Result, Storage, StorageError, StudyMaxSchema, UpgradeHandler,
    VersionChange,
};
use time::macros::datetime;

fn request(dir: &Path, version: u32) -> OpenRequest {
    OpenRequest::file("studyMax", version, dir.join("studymax.db"))
}

/// Counts upgrades and records the versions it was called with
#[derive(Default)]
struct Recording {
    calls: AtomicU32,
    last_old_version: AtomicU32,
}

#[async_trait]
impl UpgradeHandler for Recording {
    async fn upgrade(&self, change: &mut VersionChange) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_old_version
            .store(change.old_version(), Ordering::SeqCst);
        change
            .define_collection(&CollectionSchema::new("Notes").index("title"))
            .await?;
        Ok(())
    }
}

/// Creates a collection and then gives up
struct Failing;

#[async_trait]
impl UpgradeHandler for Failing {
    async fn upgrade(&self, change: &mut VersionChange) -> Result<()> {
        change
            .define_collection(&CollectionSchema::new("Notes"))
            .await?;
        Err(StorageError::Schema("refusing to finish".to_string()))
    }
}

#[tokio::test]
async fn test_reopen_same_version_skips_upgrade() {
    let dir = tempfile::tempdir().unwrap();
    let handler = Recording::default();

    let storage = Storage::open(&request(dir.path(), 1), &handler).await.unwrap();
    storage.close().await;
    let storage = Storage::open(&request(dir.path(), 1), &handler).await.unwrap();

    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    assert_eq!(handler.last_old_version.load(Ordering::SeqCst), 0);
    assert!(storage.contains("Notes"));
}

#[tokio::test]
async fn test_higher_version_upgrades_from_stored() {
    let dir = tempfile::tempdir().unwrap();
    let handler = Recording::default();

    Storage::open(&request(dir.path(), 1), &handler)
        .await
        .unwrap()
        .close()
        .await;
    let storage = Storage::open(&request(dir.path(), 3), &handler).await.unwrap();

    assert_eq!(storage.version(), 3);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
    assert_eq!(handler.last_old_version.load(Ordering::SeqCst), 1);
    // "Notes" already existed, so the second define was a no-op
    assert_eq!(storage.collection_names(), vec!["Notes"]);
}

#[tokio::test]
async fn test_lower_version_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let handler = Recording::default();

    Storage::open(&request(dir.path(), 2), &handler)
        .await
        .unwrap()
        .close()
        .await;

    let err = Storage::open(&request(dir.path(), 1), &handler)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_upgrade_rolls_back() {
    let dir = tempfile::tempdir().unwrap();

    let err = Storage::open(&request(dir.path(), 1), &Failing)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().contains("refusing to finish"));

    // Nothing from the failed upgrade was kept, and the version was not bumped
    let handler = Recording::default();
    let storage = Storage::open(&request(dir.path(), 1), &handler).await.unwrap();
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    assert_eq!(handler.last_old_version.load(Ordering::SeqCst), 0);
    assert_eq!(storage.collection_names(), vec!["Notes"]);
}

#[tokio::test]
async fn test_unique_index_over_colliding_data_fails_upgrade() {
    let dir = tempfile::tempdir().unwrap();
    let notes = DefineCollections(vec![CollectionSchema::new("Notes")]);

    let storage = Storage::open(&request(dir.path(), 1), &notes).await.unwrap();
    for _ in 0..2 {
        storage
            .insert("Notes", serde_json::json!({"title": "same"}))
            .await
            .unwrap();
    }
    storage.close().await;

    struct AddUniqueTitle;

    #[async_trait]
    impl UpgradeHandler for AddUniqueTitle {
        async fn upgrade(&self, change: &mut VersionChange) -> Result<()> {
            change
                .create_index("Notes", &IndexSpec::new("title", true))
                .await
        }
    }

    let err = Storage::open(&request(dir.path(), 2), &AddUniqueTitle)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Connection);

    let storage = Storage::open(&request(dir.path(), 1), &notes).await.unwrap();
    assert!(storage.schema("Notes").unwrap().indexes.is_empty());
}

#[tokio::test]
async fn test_legacy_unique_class_index_relaxed() {
    let dir = tempfile::tempdir().unwrap();
    let deadline = datetime!(2025-03-01 23:59);

    // A v1 database from before the policy existed
    let legacy = StudyMaxSchema::new(ForeignRefPolicy::Unique);
    let storage = Storage::open(&request(dir.path(), 1), &legacy).await.unwrap();
    for collection in [TASKS, DOCUMENTS] {
        assert!(storage.schema(collection).unwrap().find_index("class").unwrap().unique);
    }
    assert_eq!(storage.class_reference_policy(), Some(ForeignRefPolicy::Unique));
    storage
        .insert_record(&TaskRecord::new("Problem Set 3", "Algebra II", deadline))
        .await
        .unwrap();
    storage.close().await;

    let current = StudyMaxSchema::new(ForeignRefPolicy::NonUnique);
    let storage = Storage::open(&request(dir.path(), 2), &current).await.unwrap();
    for collection in [TASKS, DOCUMENTS] {
        assert!(!storage.schema(collection).unwrap().find_index("class").unwrap().unique);
    }
    assert_eq!(storage.class_reference_policy(), Some(ForeignRefPolicy::NonUnique));

    storage
        .insert_record(&TaskRecord::new("Problem Set 4", "Algebra II", deadline))
        .await
        .unwrap();
    assert_eq!(storage.count(TASKS).await.unwrap(), 2);
}

#[tokio::test]
async fn test_concurrent_first_open_shares_one_handle() {
    let dir = tempfile::tempdir().unwrap();
    let handler = Arc::new(Recording::default());
    let manager = Arc::new(ConnectionManager::new(
        request(dir.path(), 1),
        handler.clone(),
    ));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let manager = manager.clone();
        tasks.push(tokio::spawn(async move {
            let storage = manager.handle().await.unwrap();
            storage
                .insert("Notes", serde_json::json!({"title": format!("note {i}")}))
                .await
                .unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    let storage = manager.handle().await.unwrap();
    assert_eq!(storage.count("Notes").await.unwrap(), 8);
}

#[tokio::test]
async fn test_manager_close_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = ConnectionManager::studymax(request(dir.path(), 2), ForeignRefPolicy::default());

    manager
        .handle()
        .await
        .unwrap()
        .insert_record(&TaskRecord::new("Essay", "English", datetime!(2025-04-10 09:00)))
        .await
        .unwrap();
    manager.close().await;
    assert!(!manager.is_open());

    let tasks: Vec<TaskRecord> = manager.handle().await.unwrap().all_records().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_title, "Essay");
}

#[tokio::test]
async fn test_policy_change_on_existing_database_not_applied() {
    let dir = tempfile::tempdir().unwrap();
    let deadline = datetime!(2025-03-01 23:59);

    let shared = StudyMaxSchema::new(ForeignRefPolicy::NonUnique);
    Storage::open(&request(dir.path(), 2), &shared)
        .await
        .unwrap()
        .close()
        .await;

    // Same version, so no upgrade runs and the stored indexes stay as created
    let unique = StudyMaxSchema::new(ForeignRefPolicy::Unique);
    let storage = Storage::open(&request(dir.path(), 2), &unique).await.unwrap();
    assert_eq!(storage.class_reference_policy(), Some(ForeignRefPolicy::NonUnique));

    for title in ["Problem Set 3", "Problem Set 4"] {
        storage
            .insert_record(&TaskRecord::new(title, "Algebra II", deadline))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_policy_unknown_without_studymax_collections() {
    let dir = tempfile::tempdir().unwrap();
    let notes = DefineCollections(vec![CollectionSchema::new("Notes")]);

    let storage = Storage::open(&request(dir.path(), 1), &notes).await.unwrap();
    assert_eq!(storage.class_reference_policy(), None);
}
