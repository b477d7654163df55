//! Pipeline task configuration
//!
//! All settings come from environment variables with stated defaults, so the
//! tasks can run unconfigured against the public sources. Validation happens
//! before any network activity.

use gdp_common::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::storage::StorageConfig;

/// Configuration for the directory-listing mirror task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Base URL of the dataset directory listing
    pub listing_url: String,

    /// User-Agent header identifying the caller; the listing host rejects
    /// anonymous requests
    pub user_agent: String,

    /// Regex a filename must match to belong to the mirrored dataset family
    pub file_pattern: String,

    /// Key prefix under which all mirrored objects live
    pub prefix: String,

    /// Local scratch directory for downloaded files
    pub scratch_dir: PathBuf,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// Maximum attempts per file download
    pub max_retries: u32,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        MirrorConfig {
            listing_url: "https://download.bls.gov/pub/time.series/pr/".to_string(),
            user_agent: String::new(),
            file_pattern: r"^pr\.[A-Za-z0-9._-]+$".to_string(),
            prefix: "bls-data/".to_string(),
            scratch_dir: PathBuf::from("/tmp"),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl MirrorConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("LISTING_URL") {
            config.listing_url = url;
        }
        if let Ok(agent) = std::env::var("LISTING_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Ok(pattern) = std::env::var("LISTING_FILE_PATTERN") {
            config.file_pattern = pattern;
        }
        if let Ok(prefix) = std::env::var("S3_PREFIX") {
            config.prefix = prefix;
        }
        if let Ok(dir) = std::env::var("SCRATCH_DIR") {
            config.scratch_dir = PathBuf::from(dir);
        }
        config.timeout_secs = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.timeout_secs);
        config.max_retries = std::env::var("DOWNLOAD_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.max_retries);

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.listing_url.is_empty() {
            return Err(PipelineError::Config("listing URL cannot be empty".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(PipelineError::Config(
                "LISTING_USER_AGENT must identify the caller; the listing host rejects anonymous requests"
                    .to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(PipelineError::Config("timeout must be greater than 0".to_string()));
        }
        if self.max_retries == 0 {
            return Err(PipelineError::Config("max retries must be greater than 0".to_string()));
        }
        if let Err(e) = regex::Regex::new(&self.file_pattern) {
            return Err(PipelineError::Config(format!(
                "invalid file pattern '{}': {}",
                self.file_pattern, e
            )));
        }
        Ok(())
    }
}

/// Configuration for the API snapshot task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// URL of the JSON API to snapshot
    pub api_url: String,

    /// Storage key the snapshot is written to
    pub output_key: String,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        SnapshotConfig {
            api_url: "https://datausa.io/api/data?drilldowns=Nation&measures=Population"
                .to_string(),
            output_key: "datausa_population.json".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SnapshotConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("API_URL") {
            config.api_url = url;
        }
        if let Ok(key) = std::env::var("SNAPSHOT_KEY") {
            config.output_key = key;
        }
        config.timeout_secs = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.timeout_secs);

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(PipelineError::Config("API URL cannot be empty".to_string()));
        }
        if self.output_key.is_empty() {
            return Err(PipelineError::Config("snapshot key cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(PipelineError::Config("timeout must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Configuration for the notification-trigger task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Name of the downstream batch job to start
    pub job_name: String,

    /// Base URL of the job-runner service
    pub runner_url: String,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        TriggerConfig {
            job_name: "Data_analysis".to_string(),
            runner_url: String::new(),
            timeout_secs: 30,
        }
    }
}

impl TriggerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("JOB_NAME") {
            config.job_name = name;
        }
        if let Ok(url) = std::env::var("JOB_RUNNER_URL") {
            config.runner_url = url;
        }
        config.timeout_secs = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.timeout_secs);

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.job_name.is_empty() {
            return Err(PipelineError::Config("job name cannot be empty".to_string()));
        }
        if self.runner_url.is_empty() {
            return Err(PipelineError::Config(
                "JOB_RUNNER_URL must point at the job-runner service".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration for all pipeline tasks
///
/// Each task validates only its own section, so a mirror run does not demand
/// trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    pub storage: StorageConfig,
    pub mirror: MirrorConfig,
    pub snapshot: SnapshotConfig,
    pub trigger: TriggerConfig,
}

impl PipelineConfig {
    /// Load all sections from environment variables
    pub fn from_env() -> Self {
        PipelineConfig {
            storage: StorageConfig::from_env(),
            mirror: MirrorConfig::from_env(),
            snapshot: SnapshotConfig::from_env(),
            trigger: TriggerConfig::from_env(),
        }
    }
}
