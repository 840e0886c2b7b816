use super::Assertions;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a check that never fails a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SoftCheck {
    Ok(String),
    Warning(String),
}

impl SoftCheck {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::Ok(detail) | Self::Warning(detail) => detail,
        }
    }
}

impl Assertions<'_> {
    /// Accessibility findings on the current page, as a warning.
    pub async fn check_accessibility(&self) -> SoftCheck {
        match self.ui.accessibility_violations().await {
            Ok(violations) if violations.is_empty() => {
                info!("No accessibility violations");
                SoftCheck::Ok("no accessibility violations".into())
            }
            Ok(violations) => {
                warn!(count = violations.len(), "Accessibility violations: {violations:?}");
                SoftCheck::Warning(format!(
                    "{} accessibility violation(s): {}",
                    violations.len(),
                    violations.join("; ")
                ))
            }
            Err(e) => {
                warn!("Accessibility scan unavailable: {e}");
                SoftCheck::Warning(format!("accessibility scan unavailable: {e}"))
            }
        }
    }

    /// Warn when the current page loaded slower than `budget`.
    pub async fn check_page_load(&self, budget: Duration) -> SoftCheck {
        let budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        match self.ui.page_load_ms().await {
            Ok(Some(ms)) if ms <= budget_ms => {
                info!(load_ms = ms, budget_ms, "Page load within budget");
                SoftCheck::Ok(format!("page loaded in {ms}ms"))
            }
            Ok(Some(ms)) => {
                warn!(load_ms = ms, budget_ms, "Page load over budget");
                SoftCheck::Warning(format!("page loaded in {ms}ms, budget {budget_ms}ms"))
            }
            Ok(None) => SoftCheck::Warning("page load timing not reported".into()),
            Err(e) => SoftCheck::Warning(format!("page load timing unavailable: {e}")),
        }
    }
}
