use crate::workflow::{Behaviour, SimulatedWorkflow, test_config};
use hitl_harness::driver::selectors::{RESULTS_HEADER, STRATEGY_HEADER, WORKSPACE_HEADER};
use hitl_harness::driver::{ControlClient, HeadlessDriver, ScriptedDriver};
use hitl_harness::poll::{PollOptions, Waiter};
use hitl_harness::store::{MemoryStore, PatchSource, PatchStatus, ProjectStore};
use hitl_harness::verify::campaigns_per_strategy;
use hitl_harness::{HarnessConfig, Orchestrator, ScenarioStatus, SuiteReport};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

fn status(report: &SuiteReport, name: &str) -> ScenarioStatus {
    report
        .result(name)
        .unwrap_or_else(|| panic!("no result for {name}"))
        .status()
}

fn error(report: &SuiteReport, name: &str) -> String {
    report
        .result(name)
        .and_then(|r| r.error())
        .unwrap_or_default()
        .to_string()
}

fn control(config: &HarnessConfig) -> ControlClient {
    ControlClient::new(&config.orchestrator.base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn headless_suite_passes_against_healthy_workflow() {
    let server = MockServer::start().await;
    let shots = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let workflow = SimulatedWorkflow::with_behaviour(
        store.clone(),
        Behaviour {
            follow_up_proposals: 2,
            ..Behaviour::default()
        },
    );
    workflow.mount(&server).await;
    let worker = workflow.spawn();

    let mut config = test_config(&server, shots.path().to_path_buf());
    config.orchestrator.enable_edit_tests = true;
    let control = control(&config);
    let report = Orchestrator::new(&config, &store, &store, &HeadlessDriver, &control)
        .run(None)
        .await
        .unwrap();
    // The edited patch is applied after the suite stops looking.
    let fast = PollOptions::default()
        .with_retry_interval(Duration::from_millis(10))
        .with_max_retries(200);
    Waiter::new(&store, fast)
        .wait_for_strategy_version(&report.project_id, 4)
        .await
        .unwrap();
    worker.abort();

    assert!(report.is_success(), "{}", report.render_text_summary());
    assert_eq!(report.results.len(), 6);
    assert_eq!((report.passed(), report.skipped()), (5, 1));
    assert_eq!(
        report.result("accessibility_pass").unwrap().reason(),
        Some("accessibility tests disabled")
    );
    assert_eq!(workflow.runs(), 1);

    let initial = report.result("approve_initial_patch").unwrap().details().unwrap();
    assert_eq!(initial["version"], 2);
    assert_eq!(initial["path"], "secondary");
    let reflection = report
        .result("approve_reflection_patch")
        .unwrap()
        .details()
        .unwrap();
    assert_eq!(reflection["version"], 3);

    let negative = report.result("negative_cases").unwrap().details().unwrap();
    assert_eq!(negative["reapprove"]["outcome"], "verified");
    assert_eq!(negative["reject"]["outcome"], "verified");
    assert_eq!(negative["edit"]["outcome"], "verified");

    let project_id = report.project_id.as_str();
    let summary = store.get_project_summary(project_id).await.unwrap();
    assert_eq!(summary.latest_version(), Some(4));
    assert!(campaigns_per_strategy(&summary.campaigns).values().all(|n| *n == 1));
    let rejected_id = negative["reject"]["detail"]["patchId"].as_str().unwrap();
    let rejected = store.get_patch(project_id, rejected_id).await.unwrap().unwrap();
    assert_eq!(rejected.status, PatchStatus::Rejected);
    assert_eq!(rejected.source, PatchSource::Reflection);
}

#[tokio::test]
async fn duplicate_campaigns_fail_approvals_but_suite_continues() {
    let server = MockServer::start().await;
    let shots = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let workflow = SimulatedWorkflow::with_behaviour(
        store.clone(),
        Behaviour {
            duplicate_campaigns: true,
            ..Behaviour::default()
        },
    );
    workflow.mount(&server).await;
    let worker = workflow.spawn();

    let config = test_config(&server, shots.path().to_path_buf());
    let control = control(&config);
    let report = Orchestrator::new(&config, &store, &store, &HeadlessDriver, &control)
        .run(None)
        .await
        .unwrap();
    worker.abort();

    assert!(!report.is_success());
    assert_eq!(report.results.len(), 6);
    assert_eq!(status(&report, "bootstrap_initial_proposal"), ScenarioStatus::Passed);
    assert_eq!(status(&report, "approve_initial_patch"), ScenarioStatus::Failed);
    assert!(error(&report, "approve_initial_patch").contains("found 2"));
    assert_eq!(status(&report, "metrics_reflection"), ScenarioStatus::Passed);
    assert_eq!(status(&report, "approve_reflection_patch"), ScenarioStatus::Failed);
    // Headless runs never take screenshots.
    assert!(std::fs::read_dir(shots.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn accepted_reapproval_fails_negative_cases() {
    let server = MockServer::start().await;
    let shots = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let workflow = SimulatedWorkflow::with_behaviour(
        store.clone(),
        Behaviour {
            allow_reapprove: true,
            ..Behaviour::default()
        },
    );
    workflow.mount(&server).await;
    let worker = workflow.spawn();

    let config = test_config(&server, shots.path().to_path_buf());
    let control = control(&config);
    let report = Orchestrator::new(&config, &store, &store, &HeadlessDriver, &control)
        .run(None)
        .await
        .unwrap();
    worker.abort();

    assert_eq!(status(&report, "approve_reflection_patch"), ScenarioStatus::Passed);
    assert_eq!(status(&report, "negative_cases"), ScenarioStatus::Failed);
    assert!(error(&report, "negative_cases").contains("succeeded"));
}

#[tokio::test]
async fn failed_bootstrap_cascades_without_aborting() {
    let server = MockServer::start().await;
    let shots = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let workflow = SimulatedWorkflow::new(store.clone());
    workflow.mount_without_run_start(&server).await;

    let mut config = test_config(&server, shots.path().to_path_buf());
    config.poll.max_retries = 3;
    config.poll.retry_interval_ms = 10;
    let control = control(&config);
    let report = Orchestrator::new(&config, &store, &store, &HeadlessDriver, &control)
        .run(None)
        .await
        .unwrap();

    let statuses: Vec<ScenarioStatus> = report.results.iter().map(|r| r.status()).collect();
    assert_eq!(
        statuses,
        vec![
            ScenarioStatus::Failed,
            ScenarioStatus::Failed,
            ScenarioStatus::Failed,
            ScenarioStatus::Failed,
            ScenarioStatus::Failed,
            ScenarioStatus::Skipped,
        ]
    );
    assert!(error(&report, "bootstrap_initial_proposal").contains("HTTP 404"));
    assert!(error(&report, "approve_initial_patch").contains("no initial proposal"));
    assert!(error(&report, "metrics_reflection").contains("no campaign"));
    assert!(error(&report, "negative_cases").contains("no run id"));
}

#[tokio::test]
async fn interactive_run_records_screenshots_and_soft_warnings() {
    let server = MockServer::start().await;
    let shots = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let workflow = SimulatedWorkflow::new(store.clone());
    workflow.mount(&server).await;
    let worker = workflow.spawn();

    // Page headers render, but no patch cards or metric cards ever do.
    let ui = ScriptedDriver::new();
    ui.show(WORKSPACE_HEADER)
        .show(STRATEGY_HEADER)
        .show(RESULTS_HEADER);
    ui.set_violations(vec!["button without accessible name".into()]);
    ui.set_page_load_ms(Some(5_000));

    let mut config = test_config(&server, shots.path().to_path_buf());
    config.orchestrator.enable_accessibility_tests = true;
    let control = control(&config);
    let report = Orchestrator::new(&config, &store, &store, &ui, &control)
        .run(None)
        .await
        .unwrap();
    worker.abort();

    // The proposal is seen in the store but its card never renders.
    assert_eq!(status(&report, "bootstrap_initial_proposal"), ScenarioStatus::Failed);
    assert!(error(&report, "bootstrap_initial_proposal").contains("patch-card"));
    let failed = report.result("bootstrap_initial_proposal").unwrap();
    let screenshot = failed.details().unwrap()["screenshot"].as_str().unwrap();
    assert!(screenshot.ends_with("bootstrap_initial_proposal-failure.png"));

    // Approval falls back to the control plane once the card is missing.
    assert_eq!(status(&report, "approve_initial_patch"), ScenarioStatus::Passed);
    assert_eq!(
        report.result("approve_initial_patch").unwrap().details().unwrap()["path"],
        "secondary"
    );

    assert_eq!(status(&report, "metrics_reflection"), ScenarioStatus::Failed);
    assert_eq!(status(&report, "approve_reflection_patch"), ScenarioStatus::Failed);
    assert_eq!(status(&report, "negative_cases"), ScenarioStatus::Passed);

    assert_eq!(status(&report, "accessibility_pass"), ScenarioStatus::Passed);
    let pass = report.result("accessibility_pass").unwrap().details().unwrap();
    assert_eq!(pass["pages"].as_array().unwrap().len(), 3);
    assert_eq!(pass["warnings"], 6);
    assert_eq!(pass["pages"][0]["accessibility"]["outcome"], "warning");
    assert_eq!(pass["pages"][2]["screenshot"]["outcome"], "ok");

    let shots_taken = ui.screenshots();
    assert!(shots_taken.iter().any(|p| p.ends_with("results.png")));
    assert!(shots_taken.iter().any(|p| p.ends_with("metrics_reflection-failure.png")));
}
