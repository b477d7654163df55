//! GDP Pipeline Library
//!
//! Glue tasks that keep a public dataset mirrored in object storage and wire
//! storage-change notifications to a downstream batch job.
//!
//! # Tasks
//!
//! - **mirror**: scrape the dataset directory listing, download the files,
//!   and converge the object store to match (upload changed, delete stale)
//! - **snapshot**: fetch a JSON API payload and store its `data` field
//! - **trigger**: start the downstream job once per change-notification record
//!
//! # Example
//!
//! ```no_run
//! use gdp_pipeline::config::PipelineConfig;
//! use gdp_pipeline::storage::S3ObjectStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::from_env();
//!     let store = S3ObjectStore::new(&config.storage).await?;
//!     let report = gdp_pipeline::mirror::run_mirror(&config, &store).await?;
//!     println!("uploaded {} objects", report.outcome.uploaded);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod listing;
pub mod mirror;
pub mod snapshot;
pub mod storage;
pub mod sync;
pub mod trigger;
