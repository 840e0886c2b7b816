//! Query Interface over the workflow's persisted state.
//!
//! The harness never owns this data; it reads what the workflow under test
//! wrote and, for the metrics scenario, seeds rows the way an external
//! reporting job would.

pub mod memory;
pub mod sqlite;
pub mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{
    Brief, Campaign, Metric, Patch, PatchFilter, PatchSource, PatchStatus, ProjectSummary,
    StrategyVersion,
};

use crate::error::QueryError;
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, QueryError>> + Send + 'a>>;

/// Read-only accessors, all scoped to one project.
pub trait ProjectStore: Send + Sync {
    fn get_patches<'a>(&'a self, project_id: &'a str, filter: PatchFilter)
    -> StoreFuture<'a, Vec<Patch>>;

    /// Oldest to newest.
    fn get_strategy_versions<'a>(&'a self, project_id: &'a str)
    -> StoreFuture<'a, Vec<StrategyVersion>>;

    fn get_campaigns<'a>(&'a self, project_id: &'a str) -> StoreFuture<'a, Vec<Campaign>>;

    fn get_metrics<'a>(&'a self, project_id: &'a str) -> StoreFuture<'a, Vec<Metric>>;

    fn get_briefs<'a>(&'a self, project_id: &'a str) -> StoreFuture<'a, Vec<Brief>>;

    fn get_patch<'a>(
        &'a self,
        project_id: &'a str,
        patch_id: &'a str,
    ) -> StoreFuture<'a, Option<Patch>> {
        Box::pin(async move {
            let patches = self.get_patches(project_id, PatchFilter::default()).await?;
            Ok(patches.into_iter().find(|patch| patch.id == patch_id))
        })
    }

    fn get_project_summary<'a>(&'a self, project_id: &'a str) -> StoreFuture<'a, ProjectSummary> {
        Box::pin(async move {
            Ok(ProjectSummary {
                strategies: self.get_strategy_versions(project_id).await?,
                patches: self.get_patches(project_id, PatchFilter::default()).await?,
                campaigns: self.get_campaigns(project_id).await?,
                metrics: self.get_metrics(project_id).await?,
                briefs: self.get_briefs(project_id).await?,
            })
        })
    }
}

/// Writes the harness performs itself: the seeded project and the metric rows
/// that stand in for an external reporting feed.
pub trait ProjectSeeder: Send + Sync {
    /// Reuse the project with this name, or create it.
    fn ensure_project<'a>(&'a self, name: &'a str) -> StoreFuture<'a, String>;

    /// Attach `count` metric rows to the project's newest campaign.
    fn seed_metrics<'a>(&'a self, project_id: &'a str, count: u32) -> StoreFuture<'a, Vec<Metric>>;
}

/// Deterministic metric row for seed index `index`, with derived ratios filled in.
pub fn seeded_metric(campaign_id: &str, index: u32) -> Metric {
    let i = i64::from(index);
    let impressions = 1_000 + 100 * i;
    let clicks = 40 + 5 * i;
    let conversions = 4 + i;
    let spend = 120.0 + 15.0 * f64::from(index);
    let revenue = 360.0 + 40.0 * f64::from(index);

    #[allow(clippy::cast_precision_loss)]
    let ctr = (impressions > 0).then(|| clicks as f64 / impressions as f64);
    #[allow(clippy::cast_precision_loss)]
    let cpa = (conversions > 0).then(|| spend / conversions as f64);
    let roas = (spend > 0.0).then(|| revenue / spend);

    Metric {
        id: Uuid::new_v4().to_string(),
        campaign_id: campaign_id.to_string(),
        impressions,
        clicks,
        spend,
        conversions,
        revenue,
        ctr,
        cpa,
        roas,
        recorded_at: Utc::now(),
    }
}
