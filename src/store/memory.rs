use super::types::{
    Brief, Campaign, Metric, Patch, PatchFilter, PatchSource, PatchStatus, StrategyVersion,
};
use super::{ProjectSeeder, ProjectStore, StoreFuture, seeded_metric};
use crate::error::QueryError;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    projects: HashMap<String, String>,
    patches: Vec<Patch>,
    strategies: Vec<StrategyVersion>,
    campaigns: Vec<Campaign>,
    metrics: Vec<Metric>,
    briefs: Vec<Brief>,
}

/// In-process store for headless dry runs and tests.
///
/// Clones share state, so a simulated workflow can write while the harness
/// reads through the Query Interface.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, QueryError> {
        self.state
            .lock()
            .map_err(|_| QueryError::Backend("memory store lock poisoned".into()))
    }

    pub fn insert_patch(
        &self,
        project_id: &str,
        source: PatchSource,
        status: PatchStatus,
    ) -> Result<Patch, QueryError> {
        let patch = Patch {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            source,
            status,
            justification: None,
            created_at: Utc::now(),
        };
        self.lock()?.patches.push(patch.clone());
        Ok(patch)
    }

    /// Returns the previous status, or `None` when the patch does not exist.
    pub fn set_patch_status(
        &self,
        patch_id: &str,
        status: PatchStatus,
    ) -> Result<Option<PatchStatus>, QueryError> {
        let mut state = self.lock()?;
        Ok(state
            .patches
            .iter_mut()
            .find(|patch| patch.id == patch_id)
            .map(|patch| std::mem::replace(&mut patch.status, status)))
    }

    /// Move a patch from `from` to `to`; false when it was not in `from`.
    pub fn transition_patch(
        &self,
        patch_id: &str,
        from: PatchStatus,
        to: PatchStatus,
    ) -> Result<bool, QueryError> {
        let mut state = self.lock()?;
        match state
            .patches
            .iter_mut()
            .find(|patch| patch.id == patch_id && patch.status == from)
        {
            Some(patch) => {
                patch.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Appends the next strategy version for the project.
    pub fn insert_strategy_version(&self, project_id: &str) -> Result<StrategyVersion, QueryError> {
        let mut state = self.lock()?;
        let next = state
            .strategies
            .iter()
            .filter(|s| s.project_id == project_id)
            .map(|s| s.version)
            .max()
            .unwrap_or(0)
            + 1;
        let strategy = StrategyVersion {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            version: next,
            created_at: Utc::now(),
        };
        state.strategies.push(strategy.clone());
        Ok(strategy)
    }

    pub fn insert_campaign(&self, project_id: &str, strategy_id: &str) -> Result<Campaign, QueryError> {
        let campaign = Campaign {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            strategy_id: strategy_id.to_string(),
            status: "running".into(),
            created_at: Utc::now(),
        };
        self.lock()?.campaigns.push(campaign.clone());
        Ok(campaign)
    }

    pub fn insert_brief(&self, strategy_id: &str) -> Result<Brief, QueryError> {
        let brief = Brief {
            id: Uuid::new_v4().to_string(),
            strategy_id: strategy_id.to_string(),
            created_at: Utc::now(),
        };
        self.lock()?.briefs.push(brief.clone());
        Ok(brief)
    }

    pub fn insert_metric(&self, metric: Metric) -> Result<(), QueryError> {
        self.lock()?.metrics.push(metric);
        Ok(())
    }
}

impl ProjectStore for MemoryStore {
    fn get_patches<'a>(
        &'a self,
        project_id: &'a str,
        filter: PatchFilter,
    ) -> StoreFuture<'a, Vec<Patch>> {
        Box::pin(async move {
            let state = self.lock()?;
            Ok(state
                .patches
                .iter()
                .filter(|patch| patch.project_id == project_id && filter.matches(patch))
                .cloned()
                .collect())
        })
    }

    fn get_strategy_versions<'a>(
        &'a self,
        project_id: &'a str,
    ) -> StoreFuture<'a, Vec<StrategyVersion>> {
        Box::pin(async move {
            let state = self.lock()?;
            let mut versions: Vec<StrategyVersion> = state
                .strategies
                .iter()
                .filter(|s| s.project_id == project_id)
                .cloned()
                .collect();
            versions.sort_by_key(|s| s.version);
            Ok(versions)
        })
    }

    fn get_campaigns<'a>(&'a self, project_id: &'a str) -> StoreFuture<'a, Vec<Campaign>> {
        Box::pin(async move {
            let state = self.lock()?;
            Ok(state
                .campaigns
                .iter()
                .filter(|c| c.project_id == project_id)
                .cloned()
                .collect())
        })
    }

    fn get_metrics<'a>(&'a self, project_id: &'a str) -> StoreFuture<'a, Vec<Metric>> {
        Box::pin(async move {
            let state = self.lock()?;
            Ok(state
                .metrics
                .iter()
                .filter(|m| {
                    state
                        .campaigns
                        .iter()
                        .any(|c| c.id == m.campaign_id && c.project_id == project_id)
                })
                .cloned()
                .collect())
        })
    }

    fn get_briefs<'a>(&'a self, project_id: &'a str) -> StoreFuture<'a, Vec<Brief>> {
        Box::pin(async move {
            let state = self.lock()?;
            Ok(state
                .briefs
                .iter()
                .filter(|b| {
                    state
                        .strategies
                        .iter()
                        .any(|s| s.id == b.strategy_id && s.project_id == project_id)
                })
                .cloned()
                .collect())
        })
    }
}

impl ProjectSeeder for MemoryStore {
    fn ensure_project<'a>(&'a self, name: &'a str) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let mut state = self.lock()?;
            if let Some((id, _)) = state.projects.iter().find(|(_, n)| n.as_str() == name) {
                return Ok(id.clone());
            }
            let id = Uuid::new_v4().to_string();
            state.projects.insert(id.clone(), name.to_string());
            Ok(id)
        })
    }

    fn seed_metrics<'a>(&'a self, project_id: &'a str, count: u32) -> StoreFuture<'a, Vec<Metric>> {
        Box::pin(async move {
            let mut state = self.lock()?;
            let campaign_id = state
                .campaigns
                .iter()
                .filter(|c| c.project_id == project_id)
                .max_by_key(|c| c.created_at)
                .map(|c| c.id.clone())
                .ok_or_else(|| {
                    QueryError::Backend(format!("project {project_id} has no campaign to seed"))
                })?;

            let metrics: Vec<Metric> = (0..count)
                .map(|index| seeded_metric(&campaign_id, index))
                .collect();
            state.metrics.extend(metrics.iter().cloned());
            Ok(metrics)
        })
    }
}
