use super::Assertions;
use crate::error::{HarnessError, Result};
use crate::store::ProjectSummary;
use tracing::info;

/// Expected entity counts for one project; unset fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectExpectations {
    pub strategy_version: Option<i64>,
    pub patches: Option<usize>,
    pub campaigns: Option<usize>,
    pub metrics: Option<usize>,
    pub briefs: Option<usize>,
}

impl ProjectExpectations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy_version(mut self, version: i64) -> Self {
        self.strategy_version = Some(version);
        self
    }

    pub fn patches(mut self, count: usize) -> Self {
        self.patches = Some(count);
        self
    }

    pub fn campaigns(mut self, count: usize) -> Self {
        self.campaigns = Some(count);
        self
    }

    pub fn metrics(mut self, count: usize) -> Self {
        self.metrics = Some(count);
        self
    }

    pub fn briefs(mut self, count: usize) -> Self {
        self.briefs = Some(count);
        self
    }

    /// One line per unmet expectation.
    pub fn mismatches(&self, summary: &ProjectSummary) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(expected) = self.strategy_version {
            match summary.latest_version() {
                Some(actual) if actual == expected => {}
                Some(actual) => out.push(format!("strategy version: expected {expected}, found {actual}")),
                None => out.push(format!("strategy version: expected {expected}, found none")),
            }
        }
        let counts = [
            ("patches", self.patches, summary.patches.len()),
            ("campaigns", self.campaigns, summary.campaigns.len()),
            ("metrics", self.metrics, summary.metrics.len()),
            ("briefs", self.briefs, summary.briefs.len()),
        ];
        for (entity, expected, actual) in counts {
            if let Some(expected) = expected
                && expected != actual
            {
                out.push(format!("{entity}: expected {expected}, found {actual}"));
            }
        }
        out
    }
}

impl Assertions<'_> {
    /// Check every supplied expectation against a single summary read.
    pub async fn assert_project_state(
        &self,
        project_id: &str,
        expected: &ProjectExpectations,
    ) -> Result<ProjectSummary> {
        let summary = self.store.get_project_summary(project_id).await?;
        let mismatches = expected.mismatches(&summary);
        if !mismatches.is_empty() {
            return Err(HarnessError::assertion(format!(
                "project {project_id} state mismatch: {}",
                mismatches.join("; ")
            )));
        }
        info!(project_id, "Project state matches expectations");
        Ok(summary)
    }
}
