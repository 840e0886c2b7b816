use serde::Serialize;
use serde_json::{Value, json};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

/// Outcome of one scenario execution. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    name: String,
    status: ScenarioStatus,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ScenarioResult {
    pub fn passed(name: impl Into<String>, duration_ms: u64, details: Value) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Passed,
            duration_ms,
            error: None,
            details: Some(details),
        }
    }

    pub fn failed(
        name: impl Into<String>,
        duration_ms: u64,
        error: impl Into<String>,
        details: Option<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Failed,
            duration_ms,
            error: Some(error.into()),
            details,
        }
    }

    /// A scenario whose precondition was absent or which is disabled.
    pub fn skipped(name: impl Into<String>, duration_ms: u64, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Skipped,
            duration_ms,
            error: None,
            details: Some(json!({ "reason": reason.into() })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ScenarioStatus {
        self.status
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Skip reason, when skipped.
    pub fn reason(&self) -> Option<&str> {
        self.details
            .as_ref()
            .filter(|_| self.status == ScenarioStatus::Skipped)
            .and_then(|d| d.get("reason"))
            .and_then(Value::as_str)
    }
}
