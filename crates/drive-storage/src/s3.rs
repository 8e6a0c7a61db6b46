use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};

/// S3 storage implementation
///
/// Buckets have no directories: `make_directory` is a no-op and
/// `delete_directory` removes every object under the prefix.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region; falls back to the environment when `None`
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: Option<String>,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket.clone());

        if let Some(region) = region {
            builder = builder.with_region(region);
        }

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage { store, bucket })
    }

    fn location(key: &str) -> Path {
        Path::from(key.to_string())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self.store.head(&Self::location(key)).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn rename(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        self.copy(from_key, to_key).await?;

        let result: ObjectResult<_> = self.store.delete(&Self::location(from_key)).await;
        result.map_err(|e| {
            StorageError::MoveFailed(format!("Copied {from_key} but failed to delete it: {e}"))
        })?;

        Ok(())
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .copy(&Self::location(from_key), &Self::location(to_key))
            .await;

        result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(from_key.to_string()),
            other => StorageError::BackendError(other.to_string()),
        })?;

        tracing::info!(
            bucket = %self.bucket,
            from_key = %from_key,
            to_key = %to_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 copy successful"
        );

        Ok(())
    }

    async fn make_directory(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn delete_directory(&self, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let prefix = Self::location(key);

        let objects: Vec<_> = object_store::ObjectStore::list(&self.store, Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        let count = objects.len();
        for meta in objects {
            let result: ObjectResult<_> = self.store.delete(&meta.location).await;
            result.map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %meta.location,
                    "S3 delete failed"
                );
                StorageError::DeleteFailed(e.to_string())
            })?;
        }

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %key,
            objects = count,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 prefix deleted"
        );

        Ok(())
    }

    async fn import(&self, source: &std::path::Path, key: &str) -> StorageResult<()> {
        let data = tokio::fs::read(source).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", source.display(), e))
        })?;

        self.write(key, data).await?;

        tokio::fs::remove_file(source).await.map_err(|e| {
            StorageError::MoveFailed(format!(
                "Uploaded {} but failed to remove it: {}",
                source.display(),
                e
            ))
        })?;

        Ok(())
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.get(&Self::location(key)).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn write(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let size = data.len() as u64;

        let result: ObjectResult<_> = self
            .store
            .put(&Self::location(key), PutPayload::from(Bytes::from(data)))
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    fn driver(&self) -> &'static str {
        "s3"
    }
}
