use object_store::{
    ClientOptions, ObjectStore, aws::AmazonS3Builder, local::LocalFileSystem, memory::InMemory,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

/// Failure to establish a client for the configured bucket.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to build {backend:?} client for bucket '{bucket}': {source}")]
    Client {
        backend: StorageBackend,
        bucket: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Failed to prepare local bucket directory {}: {source}", path.display())]
    LocalRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Create an object store scoped to `bucket`.
///
/// Credentials for `s3` come from the standard `AWS_*` environment variables
/// (or the instance role), exactly as `AmazonS3Builder::from_env` resolves them.
pub fn create_bucket_store(
    bucket: &str,
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStore>, SessionError> {
    match config.backend {
        StorageBackend::S3 => Ok(Arc::new(create_s3_builder(bucket, config).build().map_err(
            |source| SessionError::Client {
                backend: config.backend,
                bucket: bucket.to_string(),
                source,
            },
        )?)),
        StorageBackend::File => {
            let path = PathBuf::from(&config.root).join(bucket);
            std::fs::create_dir_all(&path).map_err(|source| SessionError::LocalRoot {
                path: path.clone(),
                source,
            })?;
            let store =
                LocalFileSystem::new_with_prefix(&path).map_err(|source| SessionError::Client {
                    backend: config.backend,
                    bucket: bucket.to_string(),
                    source,
                })?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => Ok(Arc::new(InMemory::new())),
    }
}

/// S3 builder for a bucket, honouring endpoint/region overrides.
pub fn create_s3_builder(bucket: &str, config: &StorageConfig) -> AmazonS3Builder {
    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .with_client_options(ClientOptions::new().with_timeout(config.request_timeout));

    if let Some(region) = &config.region {
        builder = builder.with_region(region);
    }

    // S3-compatible stores (MinIO, LocalStack) want path-style requests
    if let Some(endpoint) = &config.endpoint {
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(endpoint.starts_with("http://"))
            .with_virtual_hosted_style_request(false);
    }

    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::path::Path as ObjectPath;

    #[test]
    fn test_create_memory_store() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        };
        let store = create_bucket_store("tariff-files", &config).unwrap();
        assert!(Arc::strong_count(&store) == 1);
    }

    #[tokio::test]
    async fn test_file_store_is_rooted_at_bucket_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            root: temp_dir.path().to_string_lossy().to_string(),
            ..Default::default()
        };

        let store = create_bucket_store("tariff-files", &config).unwrap();
        store
            .put(&ObjectPath::from("uk/reporting/file.csv"), "data".into())
            .await
            .unwrap();

        assert!(
            temp_dir
                .path()
                .join("tariff-files/uk/reporting/file.csv")
                .exists()
        );
    }

    #[test]
    fn test_s3_store_with_custom_endpoint() {
        let config = StorageConfig {
            backend: StorageBackend::S3,
            endpoint: Some("http://localhost:9000".to_string()),
            region: Some("eu-west-2".to_string()),
            ..Default::default()
        };
        assert!(create_bucket_store("tariff-files", &config).is_ok());
    }
}
