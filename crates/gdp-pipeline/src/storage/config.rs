use gdp_common::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "ap-southeast-2".to_string(),
            bucket: "bls-gov-dataset".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: false,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env::var("S3_ENDPOINT").ok(),
            region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or(defaults.region),
            bucket: env::var("S3_BUCKET")
                .or_else(|_| env::var("S3_BUCKET_NAME"))
                .unwrap_or(defaults.bucket),
            access_key: env::var("S3_ACCESS_KEY")
                .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                .unwrap_or(defaults.access_key),
            secret_key: env::var("S3_SECRET_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .unwrap_or(defaults.secret_key),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            bucket: bucket.into(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
        }
    }

    /// Validate configuration; fatal before any network activity
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(PipelineError::Config(
                "bucket name is required; set S3_BUCKET".to_string(),
            ));
        }
        if self.region.is_empty() {
            return Err(PipelineError::Config("region cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.bucket, "bls-gov-dataset");
        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.endpoint, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_minio() {
        let config = StorageConfig::for_minio("http://localhost:9000", "test-bucket");
        assert_eq!(config.endpoint, Some("http://localhost:9000".to_string()));
        assert_eq!(config.bucket, "test-bucket");
        assert!(config.path_style);
        assert_eq!(config.access_key, "minioadmin");
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let config = StorageConfig {
            bucket: String::new(),
            ..StorageConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
