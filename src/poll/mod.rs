//! Bounded polling over the Query Interface.
//!
//! Workflow side effects land asynchronously. Every wait here is bounded by
//! `max_retries` attempts and by `timeout`, whichever is reached first; a
//! query error on one attempt counts as "not yet" and the loop continues.

use crate::config::PollConfig;
use crate::error::{HarnessError, QueryError, Result};
use crate::store::{
    Campaign, Metric, Patch, PatchFilter, PatchStatus, ProjectStore, StrategyVersion,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub timeout: Duration,
    pub retry_interval: Duration,
    pub max_retries: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        PollConfig::default().into()
    }
}

impl From<PollConfig> for PollOptions {
    fn from(config: PollConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            retry_interval: Duration::from_millis(config.retry_interval_ms),
            max_retries: config.max_retries,
        }
    }
}

impl PollOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Query until `accept` holds for the observed value.
///
/// Returns the first accepted value, or [`HarnessError::PollTimeout`] naming
/// `target` once the attempt or time budget is spent. There is no sleep after
/// the final attempt.
pub async fn poll_until<T, Q, Fut, P>(
    target: &str,
    options: PollOptions,
    mut query: Q,
    mut accept: P,
) -> Result<T>
where
    Q: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, QueryError>>,
    P: FnMut(&T) -> bool,
{
    let max_retries = options.max_retries.max(1);
    let started = Instant::now();
    let mut attempts = 0_u32;

    loop {
        attempts += 1;
        match query().await {
            Ok(observed) if accept(&observed) => {
                debug!(target, attempts, "Poll satisfied");
                return Ok(observed);
            }
            Ok(_) => debug!(target, attempt = attempts, max_retries, "Not yet satisfied"),
            Err(e) => warn!(
                target,
                attempt = attempts,
                max_retries,
                "Query failed during poll, retrying: {e}"
            ),
        }

        if attempts >= max_retries || started.elapsed() >= options.timeout {
            break;
        }
        tokio::time::sleep(options.retry_interval).await;
    }

    Err(HarnessError::PollTimeout {
        target: target.to_string(),
        attempts,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

/// Specialized waiters sharing one poll budget.
#[derive(Clone, Copy)]
pub struct Waiter<'s> {
    store: &'s dyn ProjectStore,
    options: PollOptions,
}

impl<'s> Waiter<'s> {
    pub fn new(store: &'s dyn ProjectStore, options: PollOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> PollOptions {
        self.options
    }

    /// Same store, different budget.
    pub fn with_options(self, options: PollOptions) -> Self {
        Self { options, ..self }
    }

    /// At least `min_count` patches matching `filter`.
    pub async fn wait_for_patch(
        &self,
        project_id: &str,
        filter: PatchFilter,
        min_count: usize,
    ) -> Result<Vec<Patch>> {
        let target = format!("patch {} (>= {min_count})", filter.describe());
        poll_until(
            &target,
            self.options,
            || self.store.get_patches(project_id, filter),
            |patches| patches.len() >= min_count,
        )
        .await
    }

    /// The given patch reaching `status`.
    pub async fn wait_for_patch_status(
        &self,
        project_id: &str,
        patch_id: &str,
        status: PatchStatus,
    ) -> Result<Patch> {
        let target = format!("patch {patch_id} status={status}");
        let observed = poll_until(
            &target,
            self.options,
            || self.store.get_patch(project_id, patch_id),
            |patch| patch.as_ref().is_some_and(|p| p.status == status),
        )
        .await?;
        observed.ok_or_else(|| HarnessError::assertion(format!("patch {patch_id} disappeared")))
    }

    /// At least `min_count` metric rows.
    pub async fn wait_for_metrics(&self, project_id: &str, min_count: usize) -> Result<Vec<Metric>> {
        poll_until(
            &format!("metrics (>= {min_count})"),
            self.options,
            || self.store.get_metrics(project_id),
            |metrics| metrics.len() >= min_count,
        )
        .await
    }

    /// Newest strategy version reaching `target`; returns that newest version.
    pub async fn wait_for_strategy_version(
        &self,
        project_id: &str,
        target: i64,
    ) -> Result<StrategyVersion> {
        let versions = poll_until(
            &format!("strategy version >= {target}"),
            self.options,
            || self.store.get_strategy_versions(project_id),
            |versions: &Vec<StrategyVersion>| {
                versions.iter().map(|s| s.version).max().is_some_and(|v| v >= target)
            },
        )
        .await?;
        versions
            .into_iter()
            .max_by_key(|s| s.version)
            .ok_or_else(|| HarnessError::assertion("strategy versions disappeared"))
    }

    /// At least `min_count` campaigns.
    pub async fn wait_for_campaigns(
        &self,
        project_id: &str,
        min_count: usize,
    ) -> Result<Vec<Campaign>> {
        poll_until(
            &format!("campaigns (>= {min_count})"),
            self.options,
            || self.store.get_campaigns(project_id),
            |campaigns| campaigns.len() >= min_count,
        )
        .await
    }
}
