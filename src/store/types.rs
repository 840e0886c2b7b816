use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::Display;

use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PatchSource {
    Insights,
    Reflection,
    EditedLlm,
}

impl PatchSource {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Insights => "insights",
            Self::Reflection => "reflection",
            Self::EditedLlm => "edited_llm",
        }
    }
}

impl FromStr for PatchSource {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "insights" => Ok(Self::Insights),
            "reflection" => Ok(Self::Reflection),
            "edited_llm" => Ok(Self::EditedLlm),
            other => Err(QueryError::Decode {
                entity: "patch",
                message: format!("unknown source '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PatchStatus {
    Proposed,
    Approved,
    Rejected,
    Superseded,
}

impl PatchStatus {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Superseded => "superseded",
        }
    }
}

impl FromStr for PatchStatus {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "proposed" => Ok(Self::Proposed),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "superseded" => Ok(Self::Superseded),
            other => Err(QueryError::Decode {
                entity: "patch",
                message: format!("unknown status '{other}'"),
            }),
        }
    }
}

/// A proposed strategy change awaiting a HITL decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub id: String,
    pub project_id: String,
    pub source: PatchSource,
    pub status: PatchStatus,
    pub justification: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyVersion {
    pub id: String,
    pub project_id: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub project_id: String,
    pub strategy_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Performance record attached to a campaign. Only the count and the
/// presence of the derived ratios matter to the harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: String,
    pub campaign_id: String,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: f64,
    pub conversions: i64,
    pub revenue: f64,
    pub ctr: Option<f64>,
    pub cpa: Option<f64>,
    pub roas: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl Metric {
    pub fn has_derived_fields(&self) -> bool {
        self.ctr.is_some() && self.cpa.is_some() && self.roas.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brief {
    pub id: String,
    pub strategy_id: String,
    pub created_at: DateTime<Utc>,
}

/// Optional criteria for patch queries; `None` matches anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchFilter {
    pub source: Option<PatchSource>,
    pub status: Option<PatchStatus>,
}

impl PatchFilter {
    pub fn new(source: Option<PatchSource>, status: Option<PatchStatus>) -> Self {
        Self { source, status }
    }

    pub fn matches(&self, patch: &Patch) -> bool {
        self.source.is_none_or(|source| patch.source == source)
            && self.status.is_none_or(|status| patch.status == status)
    }

    pub fn describe(&self) -> String {
        let source = self.source.map_or_else(|| "any".to_string(), |s| s.to_string());
        let status = self.status.map_or_else(|| "any".to_string(), |s| s.to_string());
        format!("source={source} status={status}")
    }
}

/// Aggregate view of one project, fetched in a single call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    /// Oldest to newest.
    pub strategies: Vec<StrategyVersion>,
    pub patches: Vec<Patch>,
    pub campaigns: Vec<Campaign>,
    pub metrics: Vec<Metric>,
    pub briefs: Vec<Brief>,
}

impl ProjectSummary {
    pub fn latest_strategy(&self) -> Option<&StrategyVersion> {
        self.strategies.iter().max_by_key(|s| s.version)
    }

    pub fn latest_version(&self) -> Option<i64> {
        self.latest_strategy().map(|s| s.version)
    }
}

/// Offset-free layouts the workflow service and SQLite defaults write; read as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub(crate) fn parse_timestamp(entity: &'static str, raw: &str) -> Result<DateTime<Utc>, QueryError> {
    let raw = raw.trim();
    let rfc3339_err = match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => return Ok(dt.with_timezone(&Utc)),
        Err(e) => e,
    };
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| QueryError::Decode {
            entity,
            message: format!("invalid timestamp '{raw}': {rfc3339_err}"),
        })
}
