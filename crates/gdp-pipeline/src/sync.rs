//! Change-detection synchronization
//!
//! Decides which downloaded files to upload, skip, or delete so the store
//! converges to the current listing, then applies that plan with per-key
//! failure isolation. Unchanged files (same content fingerprint) cause no
//! write of any kind.

use gdp_common::{fingerprint, PipelineError, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, info, warn};

use crate::listing::LocalFile;
use crate::storage::ObjectStore;

/// One upload the plan calls for
#[derive(Debug, Clone)]
pub struct PlannedUpload {
    pub file: LocalFile,
    pub key: String,
    pub fingerprint: String,
}

/// The minimal set of operations that converges the store to the listing
#[derive(Debug, Default)]
pub struct SyncPlan {
    /// New or changed files to write
    pub uploads: Vec<PlannedUpload>,
    /// Stored keys whose basename no longer appears in the listing
    pub deletions: Vec<String>,
    /// Keys whose stored fingerprint already matches the downloaded content
    pub unchanged: Vec<String>,
}

/// A per-key failure recorded during apply
#[derive(Debug)]
pub struct SyncFailure {
    pub key: String,
    pub detail: String,
}

/// Counters and failures from applying a plan
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub uploaded: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub failures: Vec<SyncFailure>,
}

/// Compute the sync plan for one run
///
/// `existing` maps full storage keys to stored fingerprints; `prefix` is the
/// managed key namespace. Upload and deletion key sets are disjoint by
/// construction: a key is deleted only when its basename is absent from the
/// downloaded set.
///
/// An empty `downloaded` set is refused outright. Every stored key's
/// basename would be absent from it, so the plan would empty the store; a
/// degenerate fetch must never look like an intentional full removal.
pub fn plan_sync(
    downloaded: &[LocalFile],
    existing: &BTreeMap<String, String>,
    prefix: &str,
) -> Result<SyncPlan> {
    if downloaded.is_empty() {
        return Err(PipelineError::NothingDownloaded(
            "refusing to sync an empty download set; every stored object would be deleted"
                .to_string(),
        ));
    }

    let mut plan = SyncPlan::default();
    let mut present_names = BTreeSet::new();

    for file in downloaded {
        // The name counts as present even if fingerprinting fails below:
        // a file we could not read must not have its stored object deleted.
        present_names.insert(file.name.clone());

        let key = format!("{}{}", prefix, file.name);

        match fingerprint::fingerprint_file(&file.path) {
            Ok(content_fingerprint) => {
                if existing.get(&key) == Some(&content_fingerprint) {
                    debug!(key = %key, "Unchanged, skipping upload");
                    plan.unchanged.push(key);
                } else {
                    plan.uploads.push(PlannedUpload {
                        file: file.clone(),
                        key,
                        fingerprint: content_fingerprint,
                    });
                }
            },
            Err(e) => {
                warn!(
                    file = %file.name,
                    error = %e,
                    "Cannot fingerprint downloaded file; leaving its stored object untouched"
                );
            },
        }
    }

    for key in existing.keys() {
        let basename = key.rsplit('/').next().unwrap_or(key);
        if !present_names.contains(basename) {
            plan.deletions.push(key.clone());
        }
    }

    Ok(plan)
}

/// Apply a plan against the store
///
/// Each per-key failure is logged and recorded without stopping the
/// remaining operations.
pub async fn apply_sync(store: &dyn ObjectStore, plan: &SyncPlan) -> SyncOutcome {
    let mut outcome = SyncOutcome {
        skipped: plan.unchanged.len(),
        ..SyncOutcome::default()
    };

    for upload in &plan.uploads {
        let data = match tokio::fs::read(&upload.file.path).await {
            Ok(data) => data,
            Err(e) => {
                error!(key = %upload.key, error = %e, "Failed to read local file for upload");
                outcome.failures.push(SyncFailure {
                    key: upload.key.clone(),
                    detail: e.to_string(),
                });
                continue;
            },
        };

        match store.put(&upload.key, data, None).await {
            Ok(result) => {
                info!(key = %result.key, fingerprint = %result.fingerprint, "Uploaded object");
                outcome.uploaded += 1;
            },
            Err(e) => {
                error!(key = %upload.key, error = %e, "Upload failed");
                outcome.failures.push(SyncFailure {
                    key: upload.key.clone(),
                    detail: e.to_string(),
                });
            },
        }
    }

    for key in &plan.deletions {
        match store.delete(key).await {
            Ok(()) => {
                info!(key = %key, "Deleted stale object");
                outcome.deleted += 1;
            },
            Err(e) => {
                error!(key = %key, error = %e, "Delete failed");
                outcome.failures.push(SyncFailure {
                    key: key.clone(),
                    detail: e.to_string(),
                });
            },
        }
    }

    outcome
}
