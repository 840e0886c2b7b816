use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ── Top-level config ──────────────────────────────────────────────

/// Effective harness configuration.
///
/// Built once at the CLI boundary (file, then env overrides) and handed to
/// the orchestrator by value. Nothing reads process state after that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Path the config was loaded from - not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub fixtures: FixturesConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

// ── Orchestrator ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Name of the project to seed or reuse (default: "E2E Test Project")
    #[serde(default)]
    pub project_name: Option<String>,
    /// Base URL of the web app and its control plane
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Run the edit-request flow inside the negative-case scenario
    #[serde(default)]
    pub enable_edit_tests: bool,
    /// Run the accessibility / performance pass
    #[serde(default)]
    pub enable_accessibility_tests: bool,
    /// Capture a screenshot when a scenario fails
    #[serde(default = "default_true")]
    pub screenshot_on_failure: bool,
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}

fn default_true() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            project_name: None,
            base_url: default_base_url(),
            enable_edit_tests: false,
            enable_accessibility_tests: false,
            screenshot_on_failure: true,
        }
    }
}

impl OrchestratorConfig {
    pub const DEFAULT_PROJECT_NAME: &'static str = "E2E Test Project";

    pub fn project_name(&self) -> &str {
        self.project_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(Self::DEFAULT_PROJECT_NAME)
    }
}

// ── Polling ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Upper bound on a single wait (default: 30000)
    #[serde(default = "default_poll_timeout_ms")]
    pub timeout_ms: u64,
    /// Delay between attempts (default: 2000)
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Attempts before giving up (default: 15)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_poll_timeout_ms() -> u64 {
    30_000
}

fn default_retry_interval_ms() -> u64 {
    2_000
}

fn default_max_retries() -> u32 {
    15
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_poll_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            max_retries: default_max_retries(),
        }
    }
}

// ── Store ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// sqlx connection URL of the workflow database
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_database_url() -> String {
    "sqlite://hitl.db?mode=rwc".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

// ── Browser ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Drive the UI through agent-browser; when false every UI path falls back to the API
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// agent-browser session name
    #[serde(default = "default_session_name")]
    pub session_name: String,
    /// Visibility timeout for UI waits (default: 10000)
    #[serde(default = "default_ui_timeout_ms")]
    pub ui_timeout_ms: u64,
    /// Where failure screenshots are written
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: String,
}

fn default_session_name() -> String {
    "hitl-e2e".into()
}

fn default_ui_timeout_ms() -> u64 {
    10_000
}

fn default_screenshot_dir() -> String {
    "test-results/screenshots".into()
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            session_name: default_session_name(),
            ui_timeout_ms: default_ui_timeout_ms(),
            screenshot_dir: default_screenshot_dir(),
        }
    }
}

impl BrowserConfig {
    pub fn ui_timeout(&self) -> Duration {
        Duration::from_millis(self.ui_timeout_ms)
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.screenshot_dir).to_string())
    }
}

// ── Fixtures ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixturesConfig {
    /// Artifact uploaded by the bootstrap scenario
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
    /// Metric rows seeded before waiting for reflection (default: 6)
    #[serde(default = "default_metric_seed_count")]
    pub metric_seed_count: u32,
}

fn default_artifact_path() -> String {
    "fixtures/sample_artifact.csv".into()
}

fn default_metric_seed_count() -> u32 {
    6
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            metric_seed_count: default_metric_seed_count(),
        }
    }
}

impl FixturesConfig {
    pub fn artifact_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.artifact_path).to_string())
    }
}

// ── HTTP ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout for control-plane calls (default: 30)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
