//! Dataset directory listing: discovery and download
//!
//! The listing host publishes a plain HTML index of the dataset family's
//! files. Discovery scrapes that index; download persists each file to a
//! local scratch directory, best-effort per file.

pub mod downloader;
pub mod fetcher;

pub use downloader::{DownloadBatch, FileDownloader};
pub use fetcher::ListingFetcher;

use std::path::PathBuf;

/// A listing file downloaded to the scratch directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Filename as it appears in the listing (unique within one listing)
    pub name: String,
    /// Where the downloaded bytes live for the duration of the run
    pub path: PathBuf,
}
