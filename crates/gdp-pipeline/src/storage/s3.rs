//! S3-compatible object store

use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client,
};
use gdp_common::{fingerprint, PipelineError, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use super::{config::StorageConfig, ObjectStore, PutResult};

/// Object metadata key carrying the content fingerprint
///
/// Recorded on put and read back during list, so the diff never depends on
/// provider ETag semantics.
const FINGERPRINT_METADATA_KEY: &str = "fingerprint";

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3ObjectStore {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        debug!("Initializing object store with config: {:?}", config);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "gdp-storage",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Object store client initialized for bucket: {}", config.bucket);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
        })
    }

    fn is_not_found(err: impl std::fmt::Display) -> bool {
        let text = err.to_string();
        text.contains("NotFound") || text.contains("404")
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self))]
    async fn ensure_bucket(&self) -> Result<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                debug!("Bucket '{}' already exists", self.bucket);
                Ok(())
            },
            Err(e) if Self::is_not_found(&e) => {
                info!("Bucket '{}' not found, creating in {}", self.bucket, self.region);

                let constraint = BucketLocationConstraint::from(self.region.as_str());
                let bucket_config = CreateBucketConfiguration::builder()
                    .location_constraint(constraint)
                    .build();

                self.client
                    .create_bucket()
                    .bucket(&self.bucket)
                    .create_bucket_configuration(bucket_config)
                    .send()
                    .await
                    .map_err(|e| {
                        PipelineError::Provision(format!(
                            "failed to create bucket '{}': {}",
                            self.bucket, e
                        ))
                    })?;

                info!("Bucket '{}' created", self.bucket);
                Ok(())
            },
            Err(e) => Err(PipelineError::Provision(format!(
                "failed to check bucket '{}': {}",
                self.bucket, e
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn list(&self, prefix: &str) -> Result<BTreeMap<String, String>> {
        debug!("Listing objects in s3://{}/{}", self.bucket, prefix);

        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| PipelineError::Storage(format!("failed to list objects: {}", e)))?;

        let keys: Vec<String> = response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(|k| k.to_string()))
            .collect();

        let mut existing = BTreeMap::new();
        for key in keys {
            let head = self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| {
                    PipelineError::Storage(format!("failed to read metadata for '{}': {}", key, e))
                })?;

            // An object written outside this pipeline has no fingerprint
            // metadata; the empty string never matches, so it gets re-uploaded.
            let stored_fingerprint = head
                .metadata()
                .and_then(|m| m.get(FINGERPRINT_METADATA_KEY))
                .cloned()
                .unwrap_or_default();

            existing.insert(key, stored_fingerprint);
        }

        debug!("Found {} objects under s3://{}/{}", existing.len(), self.bucket, prefix);

        Ok(existing)
    }

    #[instrument(skip(self, data))]
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<String>) -> Result<PutResult> {
        let content_fingerprint = fingerprint::fingerprint_bytes(&data);
        let size = data.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .metadata(FINGERPRINT_METADATA_KEY, &content_fingerprint)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| PipelineError::Storage(format!("failed to upload '{}': {}", key, e)))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);

        Ok(PutResult {
            key: key.to_string(),
            fingerprint: content_fingerprint,
            size,
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<()> {
        debug!("Deleting s3://{}/{}", self.bucket, key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| PipelineError::Storage(format!("failed to delete '{}': {}", key, e)))?;

        info!("Deleted s3://{}/{}", self.bucket, key);

        Ok(())
    }
}
