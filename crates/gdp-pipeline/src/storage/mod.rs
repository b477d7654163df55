//! Object storage collaborators
//!
//! The sync engine and the snapshot writer talk to storage through the
//! [`ObjectStore`] trait so tests can substitute the in-memory backend for
//! the S3 client.

use async_trait::async_trait;
use gdp_common::Result;
use std::collections::BTreeMap;

pub mod config;
mod memory;
mod s3;

pub use config::StorageConfig;
pub use memory::MemoryStore;
pub use s3::S3ObjectStore;

/// Result of a successful put
#[derive(Debug, Clone)]
pub struct PutResult {
    pub key: String,
    pub fingerprint: String,
    pub size: i64,
}

/// Key/value blob storage under a single bucket
///
/// `put` computes the content fingerprint and records it with the object;
/// `list` reports it back, which is what makes the sync diff possible.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Ensure the bucket exists, creating it if absent. Idempotent.
    async fn ensure_bucket(&self) -> Result<()>;

    /// Map of full key to stored fingerprint for every object under `prefix`
    async fn list(&self, prefix: &str) -> Result<BTreeMap<String, String>>;

    /// Write an object, overwriting any prior content at `key`
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<String>) -> Result<PutResult>;

    /// Delete the object at `key`
    async fn delete(&self, key: &str) -> Result<()>;
}
