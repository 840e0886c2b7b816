use crate::error::{HarnessError, Result};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use strum::Display;
use tracing::{debug, info};

/// Decision sent to the strategy review endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// HTTP client for the workflow's control plane.
///
/// Every call is one-shot: a non-2xx response is returned as
/// [`HarnessError::ActionCall`] with status and body, never retried.
#[derive(Debug, Clone)]
pub struct ControlClient {
    client: reqwest::Client,
    base_url: String,
}

impl ControlClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `POST /api/run/start`; returns the run id.
    pub async fn start_run(&self, project_id: &str) -> Result<String> {
        let body = self
            .post_json(
                "start run",
                "/api/run/start",
                &json!({ "projectId": project_id }),
            )
            .await?;

        let run_id = extract_run_id(&body).ok_or_else(|| HarnessError::ActionCall {
            action: "start run".into(),
            status: 200,
            body: format!("response has no runId/id: {body}"),
        })?;
        info!(project_id, run_id = run_id.as_str(), "Run started");
        Ok(run_id)
    }

    /// `POST /api/projects/{id}/strategy/{approve|reject}`.
    pub async fn review_patch(
        &self,
        project_id: &str,
        patch_id: &str,
        decision: ReviewDecision,
        run_id: &str,
    ) -> Result<Value> {
        let action = format!("{decision} patch {patch_id}");
        self.post_json(
            &action,
            &format!("/api/projects/{project_id}/strategy/{decision}"),
            &json!({ "patchId": patch_id, "runId": run_id }),
        )
        .await
    }

    /// `POST /api/projects/{id}/strategy/edit`.
    pub async fn request_edit(
        &self,
        project_id: &str,
        patch_id: &str,
        run_id: &str,
        instructions: &str,
    ) -> Result<Value> {
        self.post_json(
            &format!("edit patch {patch_id}"),
            &format!("/api/projects/{project_id}/strategy/edit"),
            &json!({ "patchId": patch_id, "runId": run_id, "instructions": instructions }),
        )
        .await
    }

    /// `POST /api/projects/{id}/upload` as multipart field `file`.
    pub async fn upload_artifact(&self, project_id: &str, file: &Path) -> Result<Value> {
        let action = "upload artifact";
        let bytes = tokio::fs::read(file).await.map_err(|e| {
            anyhow::anyhow!("failed to read artifact {}: {e}", file.display())
        })?;
        let file_name = file
            .file_name()
            .map_or_else(|| "artifact".to_string(), |n| n.to_string_lossy().into_owned());

        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(file_name),
        );
        let request = self
            .client
            .post(self.url(&format!("/api/projects/{project_id}/upload")))
            .multipart(form);
        self.send(action, request).await
    }

    async fn post_json(&self, action: &str, path: &str, body: &Value) -> Result<Value> {
        debug!(action, path, "Control-plane call");
        let request = self.client.post(self.url(path)).json(body);
        self.send(action, request).await
    }

    async fn send(&self, action: &str, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| HarnessError::ActionTransport {
                action: action.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| HarnessError::ActionTransport {
                action: action.to_string(),
                message: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(HarnessError::ActionCall {
                action: action.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

fn extract_run_id(body: &Value) -> Option<String> {
    ["runId", "id", "run_id"]
        .iter()
        .filter_map(|key| body.get(key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
