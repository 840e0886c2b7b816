use crate::error::{HarnessError, Result};
use serde::Serialize;
use std::future::Future;
use strum::Display;
use tracing::{info, warn};

/// Which path satisfied a dual-path action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionPath {
    Primary,
    Secondary,
}

/// Run `primary`; only if it fails, run `secondary`.
///
/// Futures are lazy, so `secondary` does no work unless polled here.
pub async fn with_fallback<T, P, S>(label: &str, primary: P, secondary: S) -> Result<(T, ActionPath)>
where
    P: Future<Output = Result<T>>,
    S: Future<Output = Result<T>>,
{
    let primary_err = match primary.await {
        Ok(value) => {
            info!(action = label, path = "primary", "Action satisfied");
            return Ok((value, ActionPath::Primary));
        }
        Err(e) => e,
    };

    warn!(action = label, "Primary path failed, falling back: {primary_err}");
    match secondary.await {
        Ok(value) => {
            info!(action = label, path = "secondary", "Action satisfied");
            Ok((value, ActionPath::Secondary))
        }
        Err(fallback) => Err(HarnessError::FallbackExhausted {
            action: label.to_string(),
            primary: primary_err.to_string(),
            fallback: Box::new(fallback),
        }),
    }
}
