use chrono::{DateTime, Duration, Utc};
use hitl_harness::HarnessError;
use hitl_harness::poll::{PollOptions, Waiter};
use hitl_harness::store::{
    PatchFilter, PatchSource, PatchStatus, ProjectSeeder, ProjectStore, SqliteStore,
};
use hitl_harness::verify::verify_no_duplicate_campaigns;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

async fn temp_store() -> (TempDir, SqliteStore) {
    let tmp = TempDir::new().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", tmp.path().join("hitl.db").display());
    let store = SqliteStore::connect(&url).await.expect("sqlite store");
    (tmp, store)
}

async fn insert_patch(
    store: &SqliteStore,
    id: &str,
    project: &str,
    source: &str,
    status: &str,
    age_secs: i64,
) {
    sqlx::query(
        "INSERT INTO strategy_patches (patch_id, project_id, source, status, patch_data, created_at)
         VALUES (?, ?, ?, ?, '{}', ?)",
    )
    .bind(id)
    .bind(project)
    .bind(source)
    .bind(status)
    .bind((Utc::now() - Duration::seconds(age_secs)).to_rfc3339())
    .execute(store.pool())
    .await
    .unwrap();
}

async fn insert_strategy(store: &SqliteStore, id: &str, project: &str, version: i64) {
    sqlx::query(
        "INSERT INTO strategy_versions (strategy_id, project_id, version, created_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(id)
    .bind(project)
    .bind(version)
    .bind(Utc::now().to_rfc3339())
    .execute(store.pool())
    .await
    .unwrap();
}

async fn insert_campaign(store: &SqliteStore, id: &str, project: &str, strategy: &str) {
    sqlx::query(
        "INSERT INTO campaigns (campaign_id, project_id, strategy_id, created_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(id)
    .bind(project)
    .bind(strategy)
    .bind(Utc::now().to_rfc3339())
    .execute(store.pool())
    .await
    .unwrap();
}

#[tokio::test]
async fn patches_filter_by_source_and_status() {
    let (_tmp, store) = temp_store().await;
    insert_patch(&store, "p-1", "proj", "insights", "approved", 30).await;
    insert_patch(&store, "p-2", "proj", "reflection", "proposed", 20).await;
    insert_patch(&store, "p-3", "proj", "insights", "proposed", 10).await;
    insert_patch(&store, "p-4", "other", "insights", "proposed", 5).await;

    let all = store.get_patches("proj", PatchFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let proposed_insights = store
        .get_patches(
            "proj",
            PatchFilter::new(Some(PatchSource::Insights), Some(PatchStatus::Proposed)),
        )
        .await
        .unwrap();
    assert_eq!(
        proposed_insights.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        vec!["p-3"]
    );

    let proposed = store
        .get_patches("proj", PatchFilter::new(None, Some(PatchStatus::Proposed)))
        .await
        .unwrap();
    assert_eq!(proposed.len(), 2);

    let single = store.get_patch("proj", "p-1").await.unwrap().unwrap();
    assert_eq!(single.status, PatchStatus::Approved);
    assert!(store.get_patch("other", "p-1").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_status_is_a_decode_error() {
    let (_tmp, store) = temp_store().await;
    insert_patch(&store, "p-1", "proj", "insights", "archived", 0).await;

    let err = store
        .get_patches("proj", PatchFilter::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("archived"));
}

#[tokio::test]
async fn seeding_attaches_metrics_to_newest_campaign() {
    let (_tmp, store) = temp_store().await;
    let project = store.ensure_project("E2E Test Project").await.unwrap();
    assert_eq!(store.ensure_project("E2E Test Project").await.unwrap(), project);

    assert!(store.seed_metrics(&project, 6).await.is_err());

    insert_strategy(&store, "s-1", &project, 1).await;
    insert_campaign(&store, "c-1", &project, "s-1").await;
    let seeded = store.seed_metrics(&project, 6).await.unwrap();
    assert_eq!(seeded.len(), 6);

    let metrics = store.get_metrics(&project).await.unwrap();
    assert_eq!(metrics.len(), 6);
    assert!(metrics.iter().all(|m| m.campaign_id == "c-1"));
    assert!(metrics.iter().all(|m| m.has_derived_fields()));
}

#[tokio::test]
async fn summary_reads_every_table() {
    let (_tmp, store) = temp_store().await;
    insert_strategy(&store, "s-2", "proj", 2).await;
    insert_strategy(&store, "s-1", "proj", 1).await;
    insert_campaign(&store, "c-1", "proj", "s-1").await;
    sqlx::query("INSERT INTO briefs (brief_id, strategy_id, created_at) VALUES ('b-1', 's-2', ?)")
        .bind(Utc::now().to_rfc3339())
        .execute(store.pool())
        .await
        .unwrap();

    let summary = store.get_project_summary("proj").await.unwrap();

    assert_eq!(
        summary.strategies.iter().map(|s| s.version).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(summary.latest_version(), Some(2));
    assert_eq!(summary.campaigns.len(), 1);
    assert_eq!(summary.briefs[0].strategy_id, "s-2");
    assert!(summary.metrics.is_empty());
}

#[tokio::test]
async fn duplicate_campaigns_are_named() {
    let (_tmp, store) = temp_store().await;
    insert_strategy(&store, "s-1", "proj", 1).await;
    insert_strategy(&store, "s-2", "proj", 2).await;
    insert_campaign(&store, "c-1", "proj", "s-1").await;
    insert_campaign(&store, "c-2", "proj", "s-2").await;

    assert_eq!(
        verify_no_duplicate_campaigns(&store, "proj").await.unwrap().len(),
        2
    );

    insert_campaign(&store, "c-3", "proj", "s-2").await;
    let err = verify_no_duplicate_campaigns(&store, "proj")
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::ConsistencyViolation(_)));
    assert!(err.to_string().contains("s-2"));
    assert!(!err.to_string().contains("s-1"));
}

#[tokio::test]
async fn offset_free_timestamps_decode_as_utc() {
    let (_tmp, store) = temp_store().await;
    let pool = store.pool();
    for (sql, id) in [
        (
            "INSERT INTO strategy_patches (patch_id, project_id, source, status, created_at)
             VALUES (?, 'proj', 'insights', 'proposed', '2025-01-01T12:00:00.123456')",
            "p-1",
        ),
        (
            "INSERT INTO strategy_versions (strategy_id, project_id, version, created_at)
             VALUES (?, 'proj', 1, '2025-01-01 12:00:01')",
            "s-1",
        ),
        (
            // SQLite's own `YYYY-MM-DD HH:MM:SS` form.
            "INSERT INTO campaigns (campaign_id, project_id, strategy_id, created_at)
             VALUES (?, 'proj', 's-1', CURRENT_TIMESTAMP)",
            "c-1",
        ),
        (
            "INSERT INTO briefs (brief_id, strategy_id, created_at)
             VALUES (?, 's-1', '2025-01-01T12:00:02')",
            "b-1",
        ),
        (
            "INSERT INTO metrics (metric_id, campaign_id, ts, ctr, cpa, roas)
             VALUES (?, 'c-1', '2025-01-01T12:00:03.5', 0.04, 30.0, 3.0)",
            "m-1",
        ),
    ] {
        sqlx::query(sql).bind(id).execute(pool).await.unwrap();
    }

    let waiter = Waiter::new(
        &store,
        PollOptions::default()
            .with_retry_interval(StdDuration::from_millis(10))
            .with_max_retries(3),
    );
    let patches = waiter
        .wait_for_patch(
            "proj",
            PatchFilter::new(Some(PatchSource::Insights), Some(PatchStatus::Proposed)),
            1,
        )
        .await
        .unwrap();
    assert_eq!(
        patches[0].created_at,
        "2025-01-01T12:00:00.123456Z".parse::<DateTime<Utc>>().unwrap()
    );

    let summary = store.get_project_summary("proj").await.unwrap();
    assert_eq!(summary.latest_version(), Some(1));
    assert_eq!(summary.campaigns.len(), 1);
    assert_eq!(summary.briefs.len(), 1);
    assert_eq!(summary.metrics.len(), 1);
    assert!(summary.metrics[0].has_derived_fields());
}
