//! Scenario orchestration.
//!
//! Six fixed scenarios run in order against one seeded project. Each runs
//! through the same wrapper, which times it, turns errors into failed
//! results and always moves on to the next scenario.

mod catalog;
mod report;
mod result;

pub use report::SuiteReport;
pub use result::{ScenarioResult, ScenarioStatus};

use crate::actions::Actions;
use crate::assertions::Assertions;
use crate::config::HarnessConfig;
use crate::driver::{ControlClient, UiDriver};
use crate::error::{HarnessError, Result};
use crate::poll::{PollOptions, Waiter};
use crate::store::{ProjectSeeder, ProjectStore};
use chrono::Utc;
use serde_json::{Value, json};
use std::path::PathBuf;
use strum::Display;
use tokio::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ScenarioKind {
    BootstrapInitialProposal,
    ApproveInitialPatch,
    MetricsReflection,
    ApproveReflectionPatch,
    NegativeCases,
    AccessibilityPass,
}

impl ScenarioKind {
    pub const ALL: [Self; 6] = [
        Self::BootstrapInitialProposal,
        Self::ApproveInitialPatch,
        Self::MetricsReflection,
        Self::ApproveReflectionPatch,
        Self::NegativeCases,
        Self::AccessibilityPass,
    ];
}

/// What a scenario body produced when it did not fail.
#[derive(Debug)]
pub(crate) enum Outcome {
    Passed(Value),
    Skipped(String),
}

/// State handed from one scenario to the next within a run.
#[derive(Debug, Default)]
pub(crate) struct SuiteContext {
    project_id: String,
    run_id: Option<String>,
    initial_patch_id: Option<String>,
    reflection_patch_id: Option<String>,
}

impl SuiteContext {
    fn new(project_id: String) -> Self {
        Self {
            project_id,
            ..Self::default()
        }
    }

    fn run_id(&self) -> Result<&str> {
        self.run_id
            .as_deref()
            .ok_or_else(|| HarnessError::assertion("no run id: the bootstrap run never started"))
    }
}

pub struct Orchestrator<'h> {
    config: &'h HarnessConfig,
    store: &'h dyn ProjectStore,
    seeder: &'h dyn ProjectSeeder,
    ui: &'h dyn UiDriver,
    control: &'h ControlClient,
}

impl<'h> Orchestrator<'h> {
    pub fn new(
        config: &'h HarnessConfig,
        store: &'h dyn ProjectStore,
        seeder: &'h dyn ProjectSeeder,
        ui: &'h dyn UiDriver,
        control: &'h ControlClient,
    ) -> Self {
        Self {
            config,
            store,
            seeder,
            ui,
            control,
        }
    }

    fn actions(&self) -> Actions<'h> {
        Actions::new(self.ui, self.control, self.config.browser.ui_timeout())
    }

    fn waiter(&self) -> Waiter<'h> {
        Waiter::new(self.store, PollOptions::from(self.config.poll))
    }

    fn assertions(&self) -> Assertions<'h> {
        Assertions::new(self.store, self.ui, self.config.browser.ui_timeout())
    }

    /// Run every scenario against `project_id`, or against the configured
    /// project (created when missing).
    ///
    /// Only project resolution can fail; scenario failures land in the report.
    pub async fn run(&self, project_id: Option<&str>) -> Result<SuiteReport> {
        let project_id = match project_id {
            Some(id) => id.to_string(),
            None => {
                let name = self.config.orchestrator.project_name();
                let id = self.seeder.ensure_project(name).await?;
                info!(project_id = id.as_str(), name, "Seeded project");
                id
            }
        };

        let started_at = Utc::now();
        let mut ctx = SuiteContext::new(project_id.clone());
        let mut results = Vec::with_capacity(ScenarioKind::ALL.len());
        for kind in ScenarioKind::ALL {
            results.push(self.run_scenario(kind, &mut ctx).await);
        }

        let report = SuiteReport {
            project_id,
            started_at,
            finished_at: Utc::now(),
            results,
        };
        info!(
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Suite finished"
        );
        Ok(report)
    }

    async fn run_scenario(&self, kind: ScenarioKind, ctx: &mut SuiteContext) -> ScenarioResult {
        let name = kind.to_string();
        info!(scenario = name.as_str(), "Scenario started");
        let started = Instant::now();

        let outcome = match kind {
            ScenarioKind::BootstrapInitialProposal => self.bootstrap_initial_proposal(ctx).await,
            ScenarioKind::ApproveInitialPatch => self.approve_initial_patch(ctx).await,
            ScenarioKind::MetricsReflection => self.metrics_reflection(ctx).await,
            ScenarioKind::ApproveReflectionPatch => self.approve_reflection_patch(ctx).await,
            ScenarioKind::NegativeCases => self.negative_cases(ctx).await,
            ScenarioKind::AccessibilityPass => self.accessibility_pass(ctx).await,
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(Outcome::Passed(details)) => {
                info!(scenario = name.as_str(), duration_ms, "Scenario passed");
                ScenarioResult::passed(name, duration_ms, details)
            }
            Ok(Outcome::Skipped(reason)) => {
                info!(scenario = name.as_str(), reason = reason.as_str(), "Scenario skipped");
                ScenarioResult::skipped(name, duration_ms, reason)
            }
            Err(e) => {
                error!(scenario = name.as_str(), duration_ms, "Scenario failed: {e}");
                let details = self
                    .failure_screenshot(&name)
                    .await
                    .map(|path| json!({ "screenshot": path.display().to_string() }));
                ScenarioResult::failed(name, duration_ms, e.to_string(), details)
            }
        }
    }

    async fn failure_screenshot(&self, scenario: &str) -> Option<PathBuf> {
        if !self.config.orchestrator.screenshot_on_failure || !self.ui.interactive() {
            return None;
        }
        let dir = self.config.browser.screenshot_dir();
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(scenario, "Cannot create screenshot directory {}: {e}", dir.display());
            return None;
        }
        let path = dir.join(format!("{scenario}-failure.png"));
        match self.ui.screenshot(&path).await {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(scenario, "Failure screenshot not captured: {e}");
                None
            }
        }
    }
}
