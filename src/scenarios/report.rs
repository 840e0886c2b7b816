use super::result::{ScenarioResult, ScenarioStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Every scenario result of one suite run, in run order.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub project_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    fn count(&self, status: ScenarioStatus) -> usize {
        self.results.iter().filter(|r| r.status() == status).count()
    }

    pub fn passed(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(ScenarioStatus::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(ScenarioStatus::Skipped)
    }

    /// No scenario failed. Skips do not count against the suite.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn result(&self, name: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.name() == name)
    }

    pub fn render_text_summary(&self) -> String {
        let mut lines = vec![
            format!("project_id={}", self.project_id),
            format!(
                "duration={}ms",
                (self.finished_at - self.started_at).num_milliseconds().max(0)
            ),
        ];

        for result in &self.results {
            let mut line = format!(
                "scenario={} status={} duration={}ms",
                result.name(),
                result.status(),
                result.duration_ms()
            );
            if let Some(error) = result.error() {
                line.push_str(&format!(" error={error}"));
            }
            if let Some(reason) = result.reason() {
                line.push_str(&format!(" reason={reason}"));
            }
            lines.push(line);
        }

        lines.push(format!(
            "passed={} failed={} skipped={}",
            self.passed(),
            self.failed(),
            self.skipped()
        ));
        lines.join("\n") + "\n"
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }
}
