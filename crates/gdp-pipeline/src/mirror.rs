//! Mirror run orchestration
//!
//! One run: validate config, ensure the bucket, fetch the listing, download
//! the files, then plan and apply the sync. A run that downloads nothing is
//! fatal before any store operation happens.

use gdp_common::{PipelineError, Result};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::listing::{FileDownloader, ListingFetcher};
use crate::storage::ObjectStore;
use crate::sync::{apply_sync, plan_sync, SyncOutcome};

/// Summary of one mirror run
#[derive(Debug)]
pub struct MirrorReport {
    /// Names successfully downloaded this run
    pub downloaded: usize,
    /// Names that failed every download attempt
    pub failed_downloads: Vec<String>,
    pub outcome: SyncOutcome,
}

/// Run the listing mirror once
pub async fn run_mirror(config: &PipelineConfig, store: &dyn ObjectStore) -> Result<MirrorReport> {
    config.storage.validate()?;
    config.mirror.validate()?;

    store.ensure_bucket().await?;

    let fetcher = ListingFetcher::new(&config.mirror)?;
    let names = fetcher.fetch_file_names().await?;

    if names.is_empty() {
        warn!("Listing contained no matching files; check whether the index format changed");
    } else {
        info!(count = names.len(), "Found files in listing, starting downloads");
    }

    let downloader = FileDownloader::new(&config.mirror)?;
    let batch = downloader.download_all(&names).await?;

    if batch.files.is_empty() {
        return Err(PipelineError::NothingDownloaded(format!(
            "none of the {} listed files could be downloaded",
            names.len()
        )));
    }

    let existing = store.list(&config.mirror.prefix).await?;
    let plan = plan_sync(&batch.files, &existing, &config.mirror.prefix)?;

    info!(
        uploads = plan.uploads.len(),
        deletions = plan.deletions.len(),
        unchanged = plan.unchanged.len(),
        "Computed sync plan"
    );

    let outcome = apply_sync(store, &plan).await;

    info!(
        uploaded = outcome.uploaded,
        skipped = outcome.skipped,
        deleted = outcome.deleted,
        failures = outcome.failures.len(),
        "Mirror run complete"
    );

    Ok(MirrorReport {
        downloaded: batch.files.len(),
        failed_downloads: batch.failed,
        outcome,
    })
}
