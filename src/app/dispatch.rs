use crate::app::status::render_state;
use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use hitl_harness::HarnessConfig;
use hitl_harness::driver::{AgentBrowserDriver, ControlClient, HeadlessDriver, UiDriver};
use hitl_harness::scenarios::Orchestrator;
use hitl_harness::store::{ProjectStore, SqliteStore};
use hitl_harness::verify::verify_no_duplicate_campaigns;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

/// Browser session when enabled and installed, headless otherwise.
async fn select_driver(config: &HarnessConfig) -> Box<dyn UiDriver> {
    if !config.browser.enabled {
        info!("Browser disabled; actions will use the control plane");
        return Box::new(HeadlessDriver);
    }
    let browser = AgentBrowserDriver::new(Some(config.browser.session_name.clone()));
    if !browser.is_available().await {
        warn!("agent-browser not found; falling back to headless mode");
        return Box::new(HeadlessDriver);
    }
    Box::new(browser)
}

async fn connect_store(config: &HarnessConfig) -> Result<SqliteStore> {
    SqliteStore::connect(&config.store.database_url)
        .await
        .with_context(|| format!("Failed to open store at {}", config.store.database_url))
}

async fn run_suite(
    config: &HarnessConfig,
    project_id: Option<&str>,
    report_path: Option<&Path>,
) -> Result<ExitCode> {
    let store = connect_store(config).await?;
    let control = ControlClient::new(
        &config.orchestrator.base_url,
        Duration::from_secs(config.http.request_timeout_secs),
    )?;
    let ui = select_driver(config).await;

    let orchestrator = Orchestrator::new(config, &store, &store, ui.as_ref(), &control);
    let report = orchestrator.run(project_id).await?;

    print!("{}", report.render_text_summary());
    if let Some(path) = report_path {
        report.write_json(path)?;
        info!(path = %path.display(), "Report written");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub async fn dispatch(cli: Cli, config: HarnessConfig) -> Result<ExitCode> {
    match cli.command {
        Commands::Run { project_id, report } => {
            run_suite(&config, project_id.as_deref(), report.as_deref()).await
        }
        Commands::Verify { project_id } => {
            let store = connect_store(&config).await?;
            let counts = verify_no_duplicate_campaigns(&store, &project_id).await?;
            println!("✓ {} strategies, one campaign each", counts.len());
            Ok(ExitCode::SUCCESS)
        }
        Commands::State { project_id } => {
            let store = connect_store(&config).await?;
            let summary = store.get_project_summary(&project_id).await?;
            println!("{}", render_state(&project_id, &summary));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            if !config.config_path.as_os_str().is_empty() {
                println!("# {}", config.config_path.display());
            }
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
