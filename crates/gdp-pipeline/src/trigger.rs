//! Notification bridge
//!
//! Consumes one batch of storage-change notification records and starts the
//! configured downstream job once per record. Record bodies are decoded for
//! logging only; their content never changes what gets triggered.

use async_trait::async_trait;
use gdp_common::{PipelineError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TriggerConfig;

/// A batch of change-notification records as delivered by the queue
#[derive(Debug, Clone, Deserialize)]
pub struct EventBatch {
    #[serde(rename = "Records")]
    pub records: Vec<EventRecord>,
}

/// One queue record; the body is a JSON-encoded change notification
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    pub body: String,
}

/// Per-batch acknowledgment: one run id per record, in order
#[derive(Debug)]
pub struct TriggerReport {
    pub run_ids: Vec<String>,
}

/// Starts a named downstream batch job
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Start one run of `job_name`, returning the runner's run id
    async fn start_job(&self, job_name: &str) -> Result<String>;
}

/// Job runner backed by an HTTP job-runner service
pub struct HttpJobRunner {
    client: Client,
    runner_url: String,
}

impl HttpJobRunner {
    pub fn new(config: &TriggerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            runner_url: config.runner_url.clone(),
        })
    }
}

#[async_trait]
impl JobRunner for HttpJobRunner {
    async fn start_job(&self, job_name: &str) -> Result<String> {
        let url = format!("{}/jobs/{}/runs", self.runner_url.trim_end_matches('/'), job_name);

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| PipelineError::Job(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::Job(format!(
                "job runner returned {} for job '{}'",
                response.status(),
                job_name
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            PipelineError::Job(format!("failed to parse job runner response: {}", e))
        })?;

        body.get("run_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::Job(format!("job runner response for '{}' had no run_id", job_name))
            })
    }
}

/// Handle one notification batch: one job start per record
///
/// No deduplication and no correlation between record content and job
/// parameters; a batch of N records starts the job N times.
pub async fn run_trigger(
    config: &TriggerConfig,
    runner: &dyn JobRunner,
    batch: &EventBatch,
) -> Result<TriggerReport> {
    config.validate()?;

    info!(records = batch.records.len(), "Received change notification batch");

    let mut run_ids = Vec::new();

    for (index, record) in batch.records.iter().enumerate() {
        match serde_json::from_str::<serde_json::Value>(&record.body) {
            Ok(notification) => {
                debug!(record = index, notification = %notification, "Change notification")
            },
            Err(e) => {
                warn!(record = index, error = %e, "Record body is not valid JSON, triggering anyway")
            },
        }

        let run_id = runner.start_job(&config.job_name).await?;
        info!(record = index, job = %config.job_name, run_id = %run_id, "Started downstream job");
        run_ids.push(run_id);
    }

    Ok(TriggerReport { run_ids })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeRunner {
        starts: AtomicUsize,
        fail: bool,
    }

    impl FakeRunner {
        fn new() -> Self {
            Self { starts: AtomicUsize::new(0), fail: false }
        }

        fn failing() -> Self {
            Self { starts: AtomicUsize::new(0), fail: true }
        }
    }

    #[async_trait]
    impl JobRunner for FakeRunner {
        async fn start_job(&self, job_name: &str) -> Result<String> {
            if self.fail {
                return Err(PipelineError::Job(format!("cannot start '{}'", job_name)));
            }
            let n = self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(format!("jr_{}", n))
        }
    }

    fn config() -> TriggerConfig {
        TriggerConfig {
            job_name: "Data_analysis".to_string(),
            runner_url: "http://jobs.internal:8080".to_string(),
            timeout_secs: 5,
        }
    }

    fn batch(bodies: &[&str]) -> EventBatch {
        EventBatch {
            records: bodies
                .iter()
                .map(|body| EventRecord { body: body.to_string() })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_one_job_start_per_record() {
        let runner = FakeRunner::new();
        let batch = batch(&[
            r#"{"kind":"ObjectCreated","key":"bls-data/pr.class"}"#,
            r#"{"kind":"ObjectRemoved","key":"bls-data/pr.retired"}"#,
            r#"{"kind":"ObjectCreated","key":"bls-data/pr.data.1"}"#,
        ]);

        let report = run_trigger(&config(), &runner, &batch).await.unwrap();

        assert_eq!(runner.starts.load(Ordering::SeqCst), 3);
        assert_eq!(report.run_ids, vec!["jr_0", "jr_1", "jr_2"]);
    }

    #[tokio::test]
    async fn test_non_json_body_still_triggers() {
        let runner = FakeRunner::new();
        let batch = batch(&["not json at all"]);

        let report = run_trigger(&config(), &runner, &batch).await.unwrap();
        assert_eq!(report.run_ids, vec!["jr_0"]);
    }

    #[tokio::test]
    async fn test_empty_batch_triggers_nothing() {
        let runner = FakeRunner::new();
        let batch = batch(&[]);

        let report = run_trigger(&config(), &runner, &batch).await.unwrap();
        assert!(report.run_ids.is_empty());
        assert_eq!(runner.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_runner_failure_is_fatal() {
        let runner = FakeRunner::failing();
        let batch = batch(&[r#"{"kind":"ObjectCreated"}"#]);

        let result = run_trigger(&config(), &runner, &batch).await;
        assert!(matches!(result, Err(PipelineError::Job(_))));
    }

    #[tokio::test]
    async fn test_missing_runner_url_is_config_error() {
        let runner = FakeRunner::new();
        let config = TriggerConfig {
            runner_url: String::new(),
            ..config()
        };
        let batch = batch(&[r#"{}"#]);

        let result = run_trigger(&config, &runner, &batch).await;
        assert!(matches!(result, Err(PipelineError::Config(_))));
        assert_eq!(runner.starts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_event_batch_deserializes_queue_shape() {
        let json = r#"{
            "Records": [
                { "body": "{\"kind\":\"ObjectCreated\",\"key\":\"bls-data/pr.class\"}" }
            ]
        }"#;

        let batch: EventBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert!(batch.records[0].body.contains("ObjectCreated"));
    }
}
