use super::*;

use jobplane_catalog::MemoryJobCatalog;
use jobplane_protocols::catalog::NewJob;
use jobplane_protocols::engine::TriggerState;

use crate::job::test_support::{registry, TestEngine};

async fn seeded_catalog(jobs: Vec<NewJob>) -> Arc<MemoryJobCatalog> {
    let catalog = Arc::new(MemoryJobCatalog::new());
    for job in jobs {
        catalog.insert(job).await.unwrap();
    }
    catalog
}

fn reconciler(catalog: Arc<MemoryJobCatalog>, engine: Arc<TestEngine>) -> Reconciler {
    Reconciler::new(catalog, engine, registry())
}

#[tokio::test]
async fn test_load_catalog_registers_and_starts_engine() {
    let catalog = seeded_catalog(vec![
        NewJob::new("a", "builtin.noop", "0 0 * * * *"),
        NewJob::new("b", "builtin.log", "0 */10 * * * *"),
    ])
    .await;
    let engine = Arc::new(TestEngine::new());

    let report = reconciler(catalog.clone(), engine.clone())
        .load_catalog()
        .await
        .unwrap();

    assert_eq!(report.registered.len(), 2);
    assert!(report.is_clean());
    assert!(engine.is_started());
    for job in catalog.get_active().await.unwrap() {
        assert_eq!(job.sync_status, SyncStatus::Registered);
    }
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_load_catalog_is_idempotent() {
    let catalog = seeded_catalog(vec![
        NewJob::new("a", "builtin.noop", "0 0 * * * *"),
        NewJob::new("b", "builtin.noop", "0 0 * * * *"),
    ])
    .await;
    let engine = Arc::new(TestEngine::new());
    let reconciler = reconciler(catalog, engine.clone());

    reconciler.load_catalog().await.unwrap();
    let keys_after_first = engine.list_registered_keys().await.unwrap();

    let second = reconciler.load_catalog().await.unwrap();
    let keys_after_second = engine.list_registered_keys().await.unwrap();

    assert_eq!(keys_after_first, keys_after_second);
    assert_eq!(keys_after_second.len(), 2);
    assert!(second.registered.is_empty());
    assert_eq!(second.already_registered.len(), 2);
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_load_catalog_isolates_unresolvable_type() {
    let catalog = seeded_catalog(vec![
        NewJob::new("first", "builtin.noop", "0 0 * * * *"),
        NewJob::new("second", "missing.Job", "0 0 * * * *"),
        NewJob::new("third", "builtin.noop", "0 0 * * * *"),
    ])
    .await;
    let engine = Arc::new(TestEngine::new());

    let report = reconciler(catalog.clone(), engine.clone())
        .load_catalog()
        .await
        .unwrap();

    let keys: Vec<String> = engine
        .list_registered_keys()
        .await
        .unwrap()
        .into_iter()
        .map(|k| k.name)
        .collect();
    assert_eq!(keys, vec!["first", "third"]);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, JobKey::named("second"));
    assert!(report.failed[0].1.contains("missing.Job"));

    let second = catalog.find_by_name("second").await.unwrap().unwrap();
    assert_eq!(second.sync_status, SyncStatus::Unregistered);

    // The surviving jobs are live and fireable.
    assert_eq!(
        engine.trigger_state(&JobKey::named("first")).await.unwrap(),
        TriggerState::Normal
    );
    assert!(engine.fire_now(&JobKey::named("third")).await.is_ok());
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_load_catalog_isolates_bad_cron() {
    let catalog = seeded_catalog(vec![
        NewJob::new("ok", "builtin.noop", "0 0 * * * *"),
        NewJob::new("bad", "builtin.noop", "whenever"),
    ])
    .await;
    let engine = Arc::new(TestEngine::new());

    let report = reconciler(catalog, engine.clone())
        .load_catalog()
        .await
        .unwrap();

    assert_eq!(report.registered, vec![JobKey::named("ok")]);
    assert_eq!(report.failed[0].0, JobKey::named("bad"));
    assert!(engine.is_started());
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sweep_registers_missing_and_removes_orphans() {
    let catalog = seeded_catalog(vec![NewJob::new("kept", "builtin.noop", "0 0 * * * *")]).await;
    let engine = Arc::new(TestEngine::new());
    let reconciler = reconciler(catalog.clone(), engine.clone());

    let orphan = catalog
        .insert(NewJob::new("orphan", "builtin.noop", "0 0 * * * *"))
        .await
        .unwrap();
    reconciler.load_catalog().await.unwrap();
    catalog.soft_delete(orphan.id).await.unwrap();

    let report = reconciler.sweep().await.unwrap();

    assert_eq!(report.removed, vec![JobKey::named("orphan")]);
    assert_eq!(report.already_registered, vec![JobKey::named("kept")]);
    assert!(!engine.exists(&JobKey::named("orphan")).await.unwrap());

    catalog
        .insert(NewJob::new("late", "builtin.noop", "0 0 * * * *"))
        .await
        .unwrap();
    let report = reconciler.sweep().await.unwrap();
    assert_eq!(report.registered, vec![JobKey::named("late")]);
    let late = catalog.find_by_name("late").await.unwrap().unwrap();
    assert_eq!(late.sync_status, SyncStatus::Registered);
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sweep_reports_unrepairable_rows() {
    let catalog = seeded_catalog(vec![NewJob::new("lost", "missing.Job", "0 0 * * * *")]).await;
    let engine = Arc::new(TestEngine::new());

    let report = reconciler(catalog.clone(), engine).sweep().await.unwrap();

    assert!(!report.is_clean());
    let lost = catalog.find_by_name("lost").await.unwrap().unwrap();
    assert_eq!(lost.sync_status, SyncStatus::Unregistered);
}

#[tokio::test]
async fn test_sweep_refreshes_stale_payload() {
    let catalog = seeded_catalog(vec![
        NewJob::new("report", "builtin.log", "0 0 * * * *").with_data("old")
    ])
    .await;
    let engine = Arc::new(TestEngine::new());
    let reconciler = reconciler(catalog.clone(), engine.clone());
    reconciler.load_catalog().await.unwrap();

    let mut row = catalog.find_by_name("report").await.unwrap().unwrap();
    row.job_data = "new".to_string();
    catalog.update(&row).await.unwrap();

    let report = reconciler.sweep().await.unwrap();

    let key = JobKey::named("report");
    assert_eq!(report.refreshed, vec![key.clone()]);
    assert!(report.rescheduled.is_empty());
    assert!(report.already_registered.is_empty());
    assert_eq!(engine.payload(&key).await.unwrap().as_deref(), Some("new"));
    assert_eq!(engine.trigger(&key).await.unwrap().unwrap().revision, 0);

    let again = reconciler.sweep().await.unwrap();
    assert!(again.refreshed.is_empty());
    assert_eq!(again.already_registered, vec![key]);
    engine.shutdown().await.unwrap();
}
