//! Action primitives: each performs one externally visible action and returns
//! once a stable post-condition holds.

mod fallback;

pub use fallback::{ActionPath, with_fallback};

use crate::driver::selectors::{
    self, APPROVE_BUTTON, DIFF_VIEWER, EDIT_BUTTON, EDIT_INPUT, EDIT_SUBMIT, FILE_DROP_ZONE,
    FILE_INPUT, REJECT_BUTTON, REVIEW_BUTTON, STRATEGY_HEADER, WORKSPACE_HEADER,
};
use crate::driver::{ControlClient, ReviewDecision, UiDriver};
use crate::error::{HarnessError, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use strum::Display;
use tracing::info;

/// How a file reached the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UploadPath {
    DropZone,
    FileInput,
    Api,
}

pub struct Actions<'h> {
    ui: &'h dyn UiDriver,
    control: &'h ControlClient,
    ui_timeout: Duration,
}

impl<'h> Actions<'h> {
    pub fn new(ui: &'h dyn UiDriver, control: &'h ControlClient, ui_timeout: Duration) -> Self {
        Self {
            ui,
            control,
            ui_timeout,
        }
    }

    pub fn ui(&self) -> &'h dyn UiDriver {
        self.ui
    }

    pub fn control(&self) -> &'h ControlClient {
        self.control
    }

    pub fn ui_timeout(&self) -> Duration {
        self.ui_timeout
    }

    /// Navigate to `path` under the base URL; with `ready`, block until it is visible.
    pub async fn navigate_and_wait(&self, path: &str, ready: Option<&str>) -> Result<()> {
        let url = format!("{}{path}", self.control.base_url());
        self.ui.goto(&url).await?;
        if let Some(selector) = ready {
            self.ui.wait_for_visible(selector, self.ui_timeout).await?;
        }
        Ok(())
    }

    /// Set `file` on the drop zone when it is visible, else on the generic file input.
    pub async fn upload_file(&self, file: &Path, drop_zone: &str) -> Result<UploadPath> {
        let path = if self.ui.is_visible(drop_zone).await? {
            self.ui.set_input_files(drop_zone, file).await?;
            UploadPath::DropZone
        } else {
            self.ui.set_input_files(FILE_INPUT, file).await?;
            UploadPath::FileInput
        };
        info!(file = %file.display(), path = %path, "File set for upload");
        Ok(path)
    }

    /// Upload through the workspace page, falling back to the upload endpoint.
    pub async fn upload_artifact(&self, project_id: &str, file: &Path) -> Result<UploadPath> {
        let ui_path = async {
            self.navigate_and_wait(&selectors::workspace_path(project_id), Some(WORKSPACE_HEADER))
                .await?;
            self.upload_file(file, FILE_DROP_ZONE).await
        };
        let api_path = async {
            self.control.upload_artifact(project_id, file).await?;
            Ok::<_, HarnessError>(UploadPath::Api)
        };
        let (path, _) = with_fallback("upload artifact", ui_path, api_path).await?;
        Ok(path)
    }

    pub async fn start_run(&self, project_id: &str) -> Result<String> {
        self.control.start_run(project_id).await
    }

    pub async fn approve_or_reject_patch(
        &self,
        project_id: &str,
        patch_id: &str,
        decision: ReviewDecision,
        run_id: &str,
    ) -> Result<Value> {
        self.control
            .review_patch(project_id, patch_id, decision, run_id)
            .await
    }

    /// Review through the patch card; the control-plane call is the fallback.
    pub async fn review_patch(
        &self,
        project_id: &str,
        patch_id: &str,
        decision: ReviewDecision,
        run_id: &str,
    ) -> Result<ActionPath> {
        let label = format!("{decision} patch {patch_id}");
        let ui_path = self.review_patch_in_ui(project_id, patch_id, decision);
        let api_path = async {
            self.approve_or_reject_patch(project_id, patch_id, decision, run_id)
                .await
                .map(|_| ())
        };
        let ((), path) = with_fallback(&label, ui_path, api_path).await?;
        Ok(path)
    }

    async fn review_patch_in_ui(
        &self,
        project_id: &str,
        patch_id: &str,
        decision: ReviewDecision,
    ) -> Result<()> {
        self.navigate_and_wait(&selectors::strategy_path(project_id), Some(STRATEGY_HEADER))
            .await?;
        self.ui
            .wait_for_visible(&selectors::patch_card(patch_id), self.ui_timeout)
            .await?;

        let review = selectors::within_patch_card(patch_id, REVIEW_BUTTON);
        if self.ui.is_visible(&review).await? {
            self.ui.click(&review).await?;
            self.ui.wait_for_visible(DIFF_VIEWER, self.ui_timeout).await?;
        }

        let button = match decision {
            ReviewDecision::Approve => APPROVE_BUTTON,
            ReviewDecision::Reject => REJECT_BUTTON,
        };
        let scoped = selectors::within_patch_card(patch_id, button);
        let target = if self.ui.is_visible(&scoped).await? {
            scoped
        } else {
            button.to_string()
        };
        self.ui.wait_for_visible(&target, self.ui_timeout).await?;
        self.ui.click(&target).await?;
        Ok(())
    }

    /// Ask for an LLM edit of a patch; the edit endpoint is the fallback.
    pub async fn request_edit(
        &self,
        project_id: &str,
        patch_id: &str,
        run_id: &str,
        instructions: &str,
    ) -> Result<ActionPath> {
        let ui_path = async {
            self.navigate_and_wait(&selectors::strategy_path(project_id), Some(STRATEGY_HEADER))
                .await?;
            let edit = selectors::within_patch_card(patch_id, EDIT_BUTTON);
            self.ui.wait_for_visible(&edit, self.ui_timeout).await?;
            self.ui.click(&edit).await?;
            self.ui.wait_for_visible(EDIT_INPUT, self.ui_timeout).await?;
            self.ui.fill(EDIT_INPUT, instructions).await?;
            self.ui.click(EDIT_SUBMIT).await?;
            Ok::<(), HarnessError>(())
        };
        let api_path = async {
            self.control
                .request_edit(project_id, patch_id, run_id, instructions)
                .await
                .map(|_| ())
        };
        let ((), path) =
            with_fallback(&format!("edit patch {patch_id}"), ui_path, api_path).await?;
        Ok(path)
    }
}
