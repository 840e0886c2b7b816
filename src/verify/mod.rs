//! Idempotency checks over the campaign table.
//!
//! A retried or concurrent approval must not produce a second campaign for the
//! same strategy version.

use crate::error::{ConsistencyViolation, Result};
use crate::store::{Campaign, ProjectStore};
use std::collections::BTreeMap;
use tracing::{error, info};

/// Campaign count per strategy id.
pub fn campaigns_per_strategy(campaigns: &[Campaign]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for campaign in campaigns {
        *counts.entry(campaign.strategy_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// Strategy ids referenced by more than one campaign, sorted.
pub fn duplicate_strategies(campaigns: &[Campaign]) -> Vec<String> {
    campaigns_per_strategy(campaigns)
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(strategy_id, _)| strategy_id)
        .collect()
}

/// Fail with every strategy id that has more than one campaign.
pub async fn verify_no_duplicate_campaigns(
    store: &dyn ProjectStore,
    project_id: &str,
) -> Result<BTreeMap<String, usize>> {
    let campaigns = store.get_campaigns(project_id).await?;
    let duplicates = duplicate_strategies(&campaigns);
    if !duplicates.is_empty() {
        error!(project_id, strategies = ?duplicates, "Duplicate campaigns detected");
        return Err(ConsistencyViolation::DuplicateCampaigns {
            strategy_ids: duplicates,
        }
        .into());
    }

    let counts = campaigns_per_strategy(&campaigns);
    info!(
        project_id,
        campaigns = campaigns.len(),
        strategies = counts.len(),
        "No duplicate campaigns"
    );
    Ok(counts)
}
