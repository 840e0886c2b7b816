//! Stable `data-testid` hooks exposed by the web app.

pub const WORKSPACE_HEADER: &str = "[data-testid=\"workspace-header\"]";
pub const STRATEGY_HEADER: &str = "[data-testid=\"strategy-header\"]";
pub const RESULTS_HEADER: &str = "[data-testid=\"results-header\"]";

pub const PATCH_CARD: &str = "[data-testid=\"patch-card\"]";
pub const REVIEW_BUTTON: &str = "[data-testid=\"review-patch-button\"]";
pub const APPROVE_BUTTON: &str = "[data-testid=\"approve-patch-button\"]";
pub const REJECT_BUTTON: &str = "[data-testid=\"reject-patch-button\"]";
pub const DIFF_VIEWER: &str = "[data-testid=\"diff-viewer\"]";

pub const UPLOADED_FILES: &str = "[data-testid=\"uploaded-files\"]";
pub const FILE_DROP_ZONE: &str = "[data-testid=\"file-drop-zone\"]";
pub const FILE_INPUT: &str = "input[type=\"file\"]";

pub const METRIC_CTR: &str = "[data-testid=\"metric-card-ctr\"]";
pub const METRIC_CPA: &str = "[data-testid=\"metric-card-cpa\"]";
pub const METRIC_ROAS: &str = "[data-testid=\"metric-card-roas\"]";

pub const EDIT_BUTTON: &str = "[data-testid=\"edit-patch-button\"]";
pub const EDIT_INPUT: &str = "[data-testid=\"edit-request-input\"]";
pub const EDIT_SUBMIT: &str = "[data-testid=\"edit-request-submit\"]";

/// Card for one patch.
pub fn patch_card(patch_id: &str) -> String {
    format!("[data-testid=\"patch-card-{patch_id}\"]")
}

/// `inner` scoped to the card of `patch_id`.
pub fn within_patch_card(patch_id: &str, inner: &str) -> String {
    format!("{} {inner}", patch_card(patch_id))
}

pub fn workspace_path(project_id: &str) -> String {
    format!("/projects/{project_id}/workspace")
}

pub fn strategy_path(project_id: &str) -> String {
    format!("/projects/{project_id}/strategy")
}

pub fn results_path(project_id: &str) -> String {
    format!("/projects/{project_id}/results")
}
