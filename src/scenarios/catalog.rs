use super::{Orchestrator, Outcome, SuiteContext};
use crate::actions::UploadPath;
use crate::assertions::{ProjectExpectations, SoftCheck};
use crate::driver::ReviewDecision;
use crate::driver::selectors::{self, RESULTS_HEADER, STRATEGY_HEADER, WORKSPACE_HEADER};
use crate::error::{HarnessError, Result};
use crate::store::{Patch, PatchFilter, PatchSource, PatchStatus};
use crate::verify::verify_no_duplicate_campaigns;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, warn};

/// Metrics the reflection step needs before it proposes anything.
const MIN_REFLECTION_METRICS: usize = 5;
const PAGE_LOAD_BUDGET: Duration = Duration::from_secs(3);
const EDIT_INSTRUCTIONS: &str = "Tighten the audience to returning customers only.";

/// Result of one check inside the negative-cases scenario.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum CheckOutcome {
    Verified { detail: Value },
    Skipped { reason: String },
}

impl CheckOutcome {
    fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

fn newest(patches: &[Patch]) -> Option<&Patch> {
    patches.iter().max_by_key(|p| p.created_at)
}

impl Orchestrator<'_> {
    /// Upload the artifact, start a run and wait for the first insights proposal.
    pub(super) async fn bootstrap_initial_proposal(
        &self,
        ctx: &mut SuiteContext,
    ) -> Result<Outcome> {
        let project_id = ctx.project_id.clone();
        let artifact = self.config.fixtures.artifact_path();
        if !artifact.is_file() {
            return Err(HarnessError::assertion(format!(
                "artifact fixture not found at {}",
                artifact.display()
            )));
        }

        let actions = self.actions();
        let upload = actions.upload_artifact(&project_id, &artifact).await?;
        if upload != UploadPath::Api
            && let Some(name) = artifact.file_name().and_then(|n| n.to_str())
        {
            self.assertions().assert_file_uploaded(name).await?;
        }

        let run_id = actions.start_run(&project_id).await?;
        info!(project_id = project_id.as_str(), run_id = run_id.as_str(), "Run started");
        ctx.run_id = Some(run_id.clone());

        let filter = PatchFilter::new(Some(PatchSource::Insights), Some(PatchStatus::Proposed));
        let patches = self.waiter().wait_for_patch(&project_id, filter, 1).await?;
        let patch = newest(&patches)
            .ok_or_else(|| HarnessError::assertion("insights proposal vanished"))?;
        ctx.initial_patch_id = Some(patch.id.clone());

        if self.ui.interactive() {
            actions
                .navigate_and_wait(&selectors::strategy_path(&project_id), Some(STRATEGY_HEADER))
                .await?;
            self.assertions()
                .assert_patch_card_visible(Some(&patch.id))
                .await?;
        }

        Ok(Outcome::Passed(json!({
            "projectId": project_id,
            "runId": run_id,
            "patchId": patch.id,
            "upload": upload,
            "proposals": patches.len(),
        })))
    }

    pub(super) async fn approve_initial_patch(&self, ctx: &mut SuiteContext) -> Result<Outcome> {
        let patch_id = ctx.initial_patch_id.clone().ok_or_else(|| {
            HarnessError::assertion("no initial proposal was observed to approve")
        })?;
        let run_id = ctx.run_id()?.to_string();
        let details = self
            .approve_and_verify(&ctx.project_id, &patch_id, &run_id)
            .await?;
        Ok(Outcome::Passed(details))
    }

    /// Seed metrics, check they are readable, then wait for a reflection proposal.
    pub(super) async fn metrics_reflection(&self, ctx: &mut SuiteContext) -> Result<Outcome> {
        let project_id = ctx.project_id.clone();
        let count = self.config.fixtures.metric_seed_count;
        let seeded = self.seeder.seed_metrics(&project_id, count).await?;
        info!(project_id = project_id.as_str(), count = seeded.len(), "Seeded metrics");

        let min_count = usize::try_from(count)
            .unwrap_or(usize::MAX)
            .min(MIN_REFLECTION_METRICS);
        let waiter = self.waiter();
        let check = self.assertions();
        waiter.wait_for_metrics(&project_id, min_count).await?;
        let metrics = check
            .assert_metrics_count_at_least(&project_id, min_count)
            .await?;
        let derived = check.assert_metrics_have_derived_fields(&project_id).await?;

        if self.ui.interactive() {
            self.actions()
                .navigate_and_wait(&selectors::results_path(&project_id), Some(RESULTS_HEADER))
                .await?;
            check.assert_metric_cards_visible().await?;
        }

        let filter = PatchFilter::new(Some(PatchSource::Reflection), Some(PatchStatus::Proposed));
        let patches = waiter.wait_for_patch(&project_id, filter, 1).await?;
        let patch = newest(&patches)
            .ok_or_else(|| HarnessError::assertion("reflection proposal vanished"))?;
        ctx.reflection_patch_id = Some(patch.id.clone());

        Ok(Outcome::Passed(json!({
            "seeded": seeded.len(),
            "metrics": metrics.len(),
            "sample": { "ctr": derived.ctr, "cpa": derived.cpa, "roas": derived.roas },
            "reflectionPatchId": patch.id,
        })))
    }

    pub(super) async fn approve_reflection_patch(
        &self,
        ctx: &mut SuiteContext,
    ) -> Result<Outcome> {
        let patch_id = ctx.reflection_patch_id.clone().ok_or_else(|| {
            HarnessError::assertion("no reflection proposal was observed to approve")
        })?;
        let run_id = ctx.run_id()?.to_string();
        let details = self
            .approve_and_verify(&ctx.project_id, &patch_id, &run_id)
            .await?;
        Ok(Outcome::Passed(details))
    }

    /// Approve and check the follow-on writes: one new version, its brief,
    /// exactly one new campaign, no duplicates anywhere.
    async fn approve_and_verify(&self, project_id: &str, patch_id: &str, run_id: &str) -> Result<Value> {
        let before = self.store.get_project_summary(project_id).await?;
        let target_version = before.latest_version().unwrap_or(0) + 1;
        let target_campaigns = before.campaigns.len() + 1;

        let path = self
            .actions()
            .review_patch(project_id, patch_id, ReviewDecision::Approve, run_id)
            .await?;

        let waiter = self.waiter();
        let check = self.assertions();
        waiter
            .wait_for_patch_status(project_id, patch_id, PatchStatus::Approved)
            .await?;
        let strategy = waiter
            .wait_for_strategy_version(project_id, target_version)
            .await?;
        check
            .assert_strategy_version(project_id, target_version)
            .await?;
        waiter
            .wait_for_campaigns(project_id, target_campaigns)
            .await?;
        let campaigns = check
            .assert_campaigns_for_strategy(project_id, &strategy.id, 1)
            .await?;
        let brief = check.assert_brief_exists(project_id, &strategy.id).await?;
        check
            .assert_project_state(
                project_id,
                &ProjectExpectations::new()
                    .strategy_version(target_version)
                    .campaigns(target_campaigns),
            )
            .await?;
        verify_no_duplicate_campaigns(self.store, project_id).await?;

        Ok(json!({
            "patchId": patch_id,
            "path": path,
            "strategyId": strategy.id,
            "version": strategy.version,
            "campaignId": campaigns.first().map(|c| c.id.clone()),
            "briefId": brief.id,
        }))
    }

    /// Re-approval must be refused, rejection must stick, edits supersede.
    pub(super) async fn negative_cases(&self, ctx: &mut SuiteContext) -> Result<Outcome> {
        let project_id = ctx.project_id.clone();
        let run_id = ctx.run_id()?.to_string();

        let reapprove = self.reapprove_is_refused(&project_id, &run_id).await?;
        let reject = self.reject_sticks(&project_id, &run_id).await?;
        let edit = if self.config.orchestrator.enable_edit_tests {
            self.edit_supersedes(&project_id, &run_id).await?
        } else {
            CheckOutcome::skipped("edit tests disabled")
        };

        if reapprove.is_skipped() && reject.is_skipped() {
            return Ok(Outcome::Skipped(
                "no approved or proposed patch to exercise".into(),
            ));
        }
        Ok(Outcome::Passed(json!({
            "reapprove": reapprove,
            "reject": reject,
            "edit": edit,
        })))
    }

    async fn reapprove_is_refused(&self, project_id: &str, run_id: &str) -> Result<CheckOutcome> {
        let approved = self
            .store
            .get_patches(project_id, PatchFilter::new(None, Some(PatchStatus::Approved)))
            .await?;
        let Some(patch) = newest(&approved) else {
            return Ok(CheckOutcome::skipped("no approved patch"));
        };
        let campaigns_before = self.store.get_campaigns(project_id).await?.len();

        let refusal = match self
            .actions()
            .approve_or_reject_patch(project_id, &patch.id, ReviewDecision::Approve, run_id)
            .await
        {
            Ok(_) => {
                return Err(HarnessError::assertion(format!(
                    "re-approving approved patch {} succeeded",
                    patch.id
                )));
            }
            Err(e) if e.is_action_call() => e.to_string(),
            Err(e) => return Err(e),
        };
        info!(patch_id = patch.id.as_str(), "Re-approval refused");

        let current = self.store.get_patch(project_id, &patch.id).await?;
        if current.as_ref().map(|p| p.status) != Some(PatchStatus::Approved) {
            return Err(HarnessError::assertion(format!(
                "patch {} is no longer approved after a refused re-approval",
                patch.id
            )));
        }
        self.assertions()
            .assert_project_state(project_id, &ProjectExpectations::new().campaigns(campaigns_before))
            .await?;
        verify_no_duplicate_campaigns(self.store, project_id).await?;

        Ok(CheckOutcome::Verified {
            detail: json!({ "patchId": patch.id, "refusal": refusal }),
        })
    }

    async fn reject_sticks(&self, project_id: &str, run_id: &str) -> Result<CheckOutcome> {
        let proposed = self
            .store
            .get_patches(project_id, PatchFilter::new(None, Some(PatchStatus::Proposed)))
            .await?;
        let Some(patch) = newest(&proposed) else {
            return Ok(CheckOutcome::skipped("no proposed patch"));
        };

        let path = self
            .actions()
            .review_patch(project_id, &patch.id, ReviewDecision::Reject, run_id)
            .await?;
        let rejected = self
            .waiter()
            .wait_for_patch_status(project_id, &patch.id, PatchStatus::Rejected)
            .await?;

        Ok(CheckOutcome::Verified {
            detail: json!({ "patchId": rejected.id, "path": path }),
        })
    }

    async fn edit_supersedes(&self, project_id: &str, run_id: &str) -> Result<CheckOutcome> {
        let proposed = self
            .store
            .get_patches(project_id, PatchFilter::new(None, Some(PatchStatus::Proposed)))
            .await?;
        let Some(patch) = newest(&proposed) else {
            return Ok(CheckOutcome::skipped("no proposed patch to edit"));
        };
        let edited = PatchFilter::new(Some(PatchSource::EditedLlm), None);
        let edited_before = self.store.get_patches(project_id, edited).await?.len();

        let path = self
            .actions()
            .request_edit(project_id, &patch.id, run_id, EDIT_INSTRUCTIONS)
            .await?;
        let waiter = self.waiter();
        let edits = waiter
            .wait_for_patch(project_id, edited, edited_before + 1)
            .await?;
        waiter
            .wait_for_patch_status(project_id, &patch.id, PatchStatus::Superseded)
            .await?;

        Ok(CheckOutcome::Verified {
            detail: json!({
                "patchId": patch.id,
                "editedPatchId": newest(&edits).map(|p| p.id.clone()),
                "path": path,
            }),
        })
    }

    /// Accessibility, load time and a screenshot per main page. Never fails.
    pub(super) async fn accessibility_pass(&self, ctx: &mut SuiteContext) -> Result<Outcome> {
        if !self.config.orchestrator.enable_accessibility_tests {
            return Ok(Outcome::Skipped("accessibility tests disabled".into()));
        }
        if !self.ui.interactive() {
            return Ok(Outcome::Skipped("no browser session".into()));
        }

        let project_id = ctx.project_id.as_str();
        let pages = [
            ("workspace", selectors::workspace_path(project_id), WORKSPACE_HEADER),
            ("strategy", selectors::strategy_path(project_id), STRATEGY_HEADER),
            ("results", selectors::results_path(project_id), RESULTS_HEADER),
        ];

        let actions = self.actions();
        let check = self.assertions();
        let mut warnings = 0;
        let mut report = Vec::with_capacity(pages.len());
        for (page, path, header) in pages {
            if let Err(e) = actions.navigate_and_wait(&path, Some(header)).await {
                warn!(page, "Page did not load: {e}");
                warnings += 1;
                report.push(json!({ "page": page, "loaded": false, "warning": e.to_string() }));
                continue;
            }
            let accessibility = check.check_accessibility().await;
            let load = check.check_page_load(PAGE_LOAD_BUDGET).await;
            let screenshot = self.page_screenshot(page).await;
            warnings += [&accessibility, &load, &screenshot]
                .iter()
                .filter(|c| c.is_warning())
                .count();
            report.push(json!({
                "page": page,
                "loaded": true,
                "accessibility": accessibility,
                "pageLoad": load,
                "screenshot": screenshot,
            }));
        }

        Ok(Outcome::Passed(json!({ "pages": report, "warnings": warnings })))
    }

    async fn page_screenshot(&self, page: &str) -> SoftCheck {
        let dir = self.config.browser.screenshot_dir();
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            return SoftCheck::Warning(format!("cannot create {}: {e}", dir.display()));
        }
        let path = dir.join(format!("{page}.png"));
        match self.ui.screenshot(&path).await {
            Ok(()) => SoftCheck::Ok(path.display().to_string()),
            Err(e) => SoftCheck::Warning(format!("screenshot failed: {e}")),
        }
    }
}
