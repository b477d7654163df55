//! GDP Pipeline - dataset mirror, API snapshot, and job trigger tasks

use anyhow::Result;
use clap::Parser;
use gdp_common::logging::{init_logging, LogConfig, LogLevel};
use gdp_pipeline::config::PipelineConfig;
use gdp_pipeline::storage::S3ObjectStore;
use gdp_pipeline::trigger::{EventBatch, HttpJobRunner};
use gdp_pipeline::{mirror, snapshot, trigger};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gdp-pipeline")]
#[command(author, version, about = "Gov data pipeline tasks")]
struct Cli {
    /// Task to run
    #[command(subcommand)]
    task: Task,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Task {
    /// Mirror the dataset directory listing into object storage
    Mirror,

    /// Fetch the API payload and store it as a JSON object
    Snapshot,

    /// Start the downstream job once per record in an event batch
    Trigger {
        /// Path to a JSON file holding the event batch
        #[arg(short, long)]
        event_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()?;
    if cli.verbose {
        log_config = log_config.with_level(LogLevel::Debug);
    }
    init_logging(&log_config)?;

    let config = PipelineConfig::from_env();

    match cli.task {
        Task::Mirror => {
            info!("Running listing mirror");
            let store = S3ObjectStore::new(&config.storage).await?;
            let report = mirror::run_mirror(&config, &store).await?;
            info!(
                downloaded = report.downloaded,
                uploaded = report.outcome.uploaded,
                skipped = report.outcome.skipped,
                deleted = report.outcome.deleted,
                "Mirror finished"
            );
        },
        Task::Snapshot => {
            info!("Running API snapshot");
            let store = S3ObjectStore::new(&config.storage).await?;
            let outcome = snapshot::run_snapshot(&config, &store).await?;
            info!(?outcome, "Snapshot finished");
        },
        Task::Trigger { event_file } => {
            info!("Running notification trigger");
            let text = std::fs::read_to_string(&event_file)?;
            let batch: EventBatch = serde_json::from_str(&text)?;
            let runner = HttpJobRunner::new(&config.trigger)?;
            let report = trigger::run_trigger(&config.trigger, &runner, &batch).await?;
            info!(jobs_started = report.run_ids.len(), "Trigger finished");
        },
    }

    Ok(())
}
