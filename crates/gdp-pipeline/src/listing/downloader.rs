//! Best-effort file download to the scratch directory

use gdp_common::{PipelineError, Result};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::LocalFile;
use crate::config::MirrorConfig;

/// Result of downloading one listing's files
#[derive(Debug, Default)]
pub struct DownloadBatch {
    /// Files persisted to the scratch directory, in listing order
    pub files: Vec<LocalFile>,
    /// Names that failed every attempt and were excluded from the run
    pub failed: Vec<String>,
}

/// Downloads listing files one at a time
///
/// A failure on one file is logged and that file is excluded; the run
/// degrades to "sync whatever succeeded" rather than all-or-nothing.
pub struct FileDownloader {
    client: Client,
    listing_url: String,
    scratch_dir: PathBuf,
    max_retries: u32,
}

impl FileDownloader {
    pub fn new(config: &MirrorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            listing_url: config.listing_url.clone(),
            scratch_dir: config.scratch_dir.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Download every named file, skipping the ones that fail
    pub async fn download_all(&self, names: &[String]) -> Result<DownloadBatch> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;

        let mut batch = DownloadBatch::default();

        for name in names {
            match self.download_one(name).await {
                Ok(file) => {
                    info!(file = %name, "Downloaded file");
                    batch.files.push(file);
                },
                Err(e) => {
                    warn!(file = %name, error = %e, "Failed to download file, excluding from sync");
                    batch.failed.push(name.clone());
                },
            }
        }

        info!(
            downloaded = batch.files.len(),
            failed = batch.failed.len(),
            "Download pass complete"
        );

        Ok(batch)
    }

    async fn download_one(&self, name: &str) -> Result<LocalFile> {
        let url = format!("{}/{}", self.listing_url.trim_end_matches('/'), name);
        let content = self.download_with_retry(&url).await?;

        let path = self.scratch_dir.join(name);
        tokio::fs::write(&path, &content).await?;

        Ok(LocalFile {
            name: name.to_string(),
            path,
        })
    }

    async fn download_with_retry(&self, url: &str) -> Result<Vec<u8>> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.fetch_bytes(url).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    warn!(
                        url,
                        attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "Download attempt failed"
                    );
                    last_error = Some(e);
                },
            }
        }

        Err(last_error
            .unwrap_or_else(|| PipelineError::Fetch(format!("download of {} failed", url))))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Fetch(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::Fetch(format!(
                "download of {} returned {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Fetch(format!("failed to read body of {}: {}", url, e)))?;

        Ok(bytes.to_vec())
    }
}
