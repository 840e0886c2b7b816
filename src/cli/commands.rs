use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `hitl-harness` - end-to-end checks for the HITL strategy workflow.
#[derive(Parser, Debug)]
#[command(name = "hitl-harness")]
#[command(version)]
#[command(
    about = "Drive the HITL workflow end to end and verify its eventually consistent writes.",
    long_about = None
)]
pub struct Cli {
    /// Config file (default: ~/.hitl-harness/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every scenario; exits non-zero when any scenario failed
    Run {
        /// Existing project to run against (default: seed by configured name)
        #[arg(long)]
        project_id: Option<String>,

        /// Write the JSON report here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Check that no strategy has more than one campaign
    Verify {
        #[arg(long)]
        project_id: String,
    },

    /// Print entity counts for a project
    State {
        #[arg(long)]
        project_id: String,
    },

    /// Print the effective configuration
    Config,
}
