use super::Assertions;
use crate::error::{HarnessError, Result};
use crate::store::{
    Brief, Campaign, Metric, Patch, PatchFilter, PatchSource, PatchStatus, StrategyVersion,
};
use tracing::info;

impl Assertions<'_> {
    /// At least one patch with this source and status.
    pub async fn assert_patch_exists(
        &self,
        project_id: &str,
        source: PatchSource,
        status: PatchStatus,
    ) -> Result<Vec<Patch>> {
        let patches = self
            .store
            .get_patches(project_id, PatchFilter::new(Some(source), Some(status)))
            .await?;
        if patches.is_empty() {
            return Err(HarnessError::assertion(format!(
                "no patch with source={source} status={status} in project {project_id}"
            )));
        }
        info!(project_id, %source, %status, count = patches.len(), "Patch exists");
        Ok(patches)
    }

    /// Newest strategy version equals `expected` exactly.
    pub async fn assert_strategy_version(
        &self,
        project_id: &str,
        expected: i64,
    ) -> Result<StrategyVersion> {
        let latest = self
            .store
            .get_strategy_versions(project_id)
            .await?
            .into_iter()
            .max_by_key(|s| s.version);
        match latest {
            Some(strategy) if strategy.version == expected => {
                info!(project_id, version = expected, "Strategy at expected version");
                Ok(strategy)
            }
            Some(strategy) => Err(HarnessError::assertion(format!(
                "expected strategy version {expected}, found {}",
                strategy.version
            ))),
            None => Err(HarnessError::assertion(format!(
                "expected strategy version {expected}, project {project_id} has none"
            ))),
        }
    }

    pub async fn assert_brief_exists(&self, project_id: &str, strategy_id: &str) -> Result<Brief> {
        let brief = self
            .store
            .get_briefs(project_id)
            .await?
            .into_iter()
            .find(|b| b.strategy_id == strategy_id)
            .ok_or_else(|| {
                HarnessError::assertion(format!("no brief for strategy {strategy_id}"))
            })?;
        info!(project_id, strategy_id, brief_id = brief.id.as_str(), "Brief exists");
        Ok(brief)
    }

    /// Exactly `expected` campaigns reference `strategy_id`.
    pub async fn assert_campaigns_for_strategy(
        &self,
        project_id: &str,
        strategy_id: &str,
        expected: usize,
    ) -> Result<Vec<Campaign>> {
        let campaigns: Vec<Campaign> = self
            .store
            .get_campaigns(project_id)
            .await?
            .into_iter()
            .filter(|c| c.strategy_id == strategy_id)
            .collect();
        if campaigns.len() != expected {
            return Err(HarnessError::assertion(format!(
                "expected {expected} campaign(s) for strategy {strategy_id}, found {}",
                campaigns.len()
            )));
        }
        info!(project_id, strategy_id, count = expected, "Campaigns created for strategy");
        Ok(campaigns)
    }

    pub async fn assert_metrics_count_at_least(
        &self,
        project_id: &str,
        min_count: usize,
    ) -> Result<Vec<Metric>> {
        let metrics = self.store.get_metrics(project_id).await?;
        if metrics.len() < min_count {
            return Err(HarnessError::assertion(format!(
                "expected at least {min_count} metrics, found {}",
                metrics.len()
            )));
        }
        info!(project_id, count = metrics.len(), min_count, "Metrics present");
        Ok(metrics)
    }

    /// At least one metric carries ctr, cpa and roas.
    pub async fn assert_metrics_have_derived_fields(&self, project_id: &str) -> Result<Metric> {
        let metric = self
            .store
            .get_metrics(project_id)
            .await?
            .into_iter()
            .find(Metric::has_derived_fields)
            .ok_or_else(|| {
                HarnessError::assertion("no metric with non-null ctr, cpa and roas")
            })?;
        info!(project_id, metric_id = metric.id.as_str(), "Derived metric fields present");
        Ok(metric)
    }
}
