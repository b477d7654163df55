//! GDP Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling, content fingerprints, and logging for the GDP
//! pipeline tasks.
//!
//! # Overview
//!
//! - **Error Handling**: the pipeline-wide error taxonomy and result alias
//! - **Fingerprints**: SHA-256 content fingerprints used for change detection
//! - **Logging**: tracing subscriber configuration and initialization
//!
//! # Example
//!
//! ```no_run
//! use gdp_common::{fingerprint, Result};
//!
//! fn changed(path: &str, stored: &str) -> Result<bool> {
//!     let current = fingerprint::fingerprint_file(path)?;
//!     Ok(current != stored)
//! }
//! ```

pub mod error;
pub mod fingerprint;
pub mod logging;

// Re-export commonly used types
pub use error::{PipelineError, Result};
