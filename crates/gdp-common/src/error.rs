//! Error types for the GDP pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the GDP pipeline
///
/// Fatal kinds (`Config`, `Fetch`, `NothingDownloaded`, `Provision`, `Job`,
/// and `Storage` when listing) abort the run. Per-file failures are logged
/// and carried in run reports instead of surfacing here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("No files downloaded: {0}")]
    NothingDownloaded(String),

    #[error("Bucket provisioning failed: {0}")]
    Provision(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Job trigger failed: {0}")]
    Job(String),
}
