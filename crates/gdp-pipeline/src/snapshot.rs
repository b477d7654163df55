//! API snapshot writer
//!
//! Fetches a JSON document, extracts its `data` field, and writes it to a
//! fixed storage key. No diffing: a non-empty field always overwrites. A
//! failed fetch or an absent/empty field skips the write and is logged, not
//! escalated.

use gdp_common::{PipelineError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{PipelineConfig, SnapshotConfig};
use crate::storage::ObjectStore;

/// What one snapshot run did
#[derive(Debug)]
pub enum SnapshotOutcome {
    Written { key: String, size: usize },
    Skipped { reason: String },
}

/// Run the API snapshot once
pub async fn run_snapshot(
    config: &PipelineConfig,
    store: &dyn ObjectStore,
) -> Result<SnapshotOutcome> {
    config.storage.validate()?;
    config.snapshot.validate()?;

    store.ensure_bucket().await?;

    let data = match fetch_data(&config.snapshot).await {
        Ok(Some(value)) => value,
        Ok(None) => {
            info!(url = %config.snapshot.api_url, "API response had no usable data field, skipping upload");
            return Ok(SnapshotOutcome::Skipped {
                reason: "response had no usable data field".to_string(),
            });
        },
        Err(e) => {
            warn!(url = %config.snapshot.api_url, error = %e, "API fetch failed, skipping upload");
            return Ok(SnapshotOutcome::Skipped { reason: e.to_string() });
        },
    };

    let body = serde_json::to_vec(&data)?;
    let size = body.len();

    match store
        .put(&config.snapshot.output_key, body, Some("application/json".to_string()))
        .await
    {
        Ok(result) => {
            info!(key = %result.key, size, "Snapshot written");
            Ok(SnapshotOutcome::Written { key: result.key, size })
        },
        Err(e) => {
            error!(key = %config.snapshot.output_key, error = %e, "Snapshot upload failed");
            Ok(SnapshotOutcome::Skipped { reason: e.to_string() })
        },
    }
}

/// Fetch the API document and extract its `data` field
///
/// `Ok(None)` means the document was retrieved but carried nothing worth
/// writing; `Err` means the retrieval or parse itself failed.
async fn fetch_data(config: &SnapshotConfig) -> Result<Option<Value>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {}", e)))?;

    let response = client.get(&config.api_url).send().await.map_err(|e| {
        PipelineError::Fetch(format!("API request to {} failed: {}", config.api_url, e))
    })?;

    if !response.status().is_success() {
        return Err(PipelineError::Fetch(format!(
            "API request to {} returned {}",
            config.api_url,
            response.status()
        )));
    }

    let document: Value = response.json().await.map_err(|e| {
        PipelineError::Fetch(format!("failed to parse API response as JSON: {}", e))
    })?;

    let data = document.get("data").cloned();

    Ok(data.filter(|value| match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::String(text) => !text.is_empty(),
        _ => true,
    }))
}
