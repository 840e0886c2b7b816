use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the harness.
///
/// Scenario code returns these so the orchestrator can record a precise
/// failure message; CLI glue continues to use `anyhow::Result` for ad-hoc
/// context chains.
#[derive(Debug, Error)]
pub enum HarnessError {
    // ── Polling ─────────────────────────────────────────────────────────
    #[error("timed out waiting for {target} after {attempts} attempts ({elapsed_ms}ms)")]
    PollTimeout {
        target: String,
        attempts: u32,
        elapsed_ms: u64,
    },

    // ── Control plane ───────────────────────────────────────────────────
    #[error("{action} failed with HTTP {status}: {body}")]
    ActionCall {
        action: String,
        status: u16,
        body: String,
    },

    #[error("{action} request failed: {message}")]
    ActionTransport { action: String, message: String },

    #[error("{action}: primary path failed ({primary}); fallback failed: {fallback}")]
    FallbackExhausted {
        action: String,
        primary: String,
        fallback: Box<HarnessError>,
    },

    // ── Invariants ──────────────────────────────────────────────────────
    #[error("consistency violation: {0}")]
    ConsistencyViolation(#[from] ConsistencyViolation),

    #[error("assertion failed: {0}")]
    Assertion(String),

    // ── Collaborators ───────────────────────────────────────────────────
    #[error("query: {0}")]
    Query(#[from] QueryError),

    #[error("ui: {0}")]
    Ui(#[from] UiError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HarnessError {
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    /// True for a non-success response from the control plane, including one
    /// reached through a failed fallback.
    pub fn is_action_call(&self) -> bool {
        match self {
            Self::ActionCall { .. } => true,
            Self::FallbackExhausted { fallback, .. } => fallback.is_action_call(),
            _ => false,
        }
    }
}

// ─── Consistency violations ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyViolation {
    #[error("strategies with more than one campaign: {}", strategy_ids.join(", "))]
    DuplicateCampaigns { strategy_ids: Vec<String> },
}

// ─── Query interface errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query failed: {0}")]
    Backend(String),

    #[error("decode {entity}: {message}")]
    Decode { entity: &'static str, message: String },

    #[error("sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
}

// ─── UI driver errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum UiError {
    #[error("browser unavailable: {0}")]
    Unavailable(String),

    #[error("element {selector} not visible after {timeout_ms}ms")]
    NotVisible { selector: String, timeout_ms: u64 },

    #[error("browser command {command} failed: {message}")]
    Command { command: String, message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, HarnessError>;
