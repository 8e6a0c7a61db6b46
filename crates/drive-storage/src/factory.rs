#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageError, StorageResult};
use drive_core::DiskDriver;
use std::sync::Arc;

/// Create a storage backend for a resolved disk driver
pub async fn create_storage(driver: &DiskDriver) -> StorageResult<Arc<dyn Storage>> {
    match driver {
        #[cfg(feature = "storage-local")]
        DiskDriver::Local { root } => {
            let storage = LocalStorage::new(root.clone()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        DiskDriver::Local { .. } => Err(StorageError::UnsupportedDriver(
            "local (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-s3")]
        DiskDriver::S3 {
            bucket,
            region,
            endpoint,
        } => {
            let storage = S3Storage::new(bucket.clone(), region.clone(), endpoint.clone()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        DiskDriver::S3 { .. } => Err(StorageError::UnsupportedDriver(
            "s3 (storage-s3 feature not enabled)".to_string(),
        )),

        DiskDriver::Rackspace { .. } => Err(StorageError::UnsupportedDriver(
            "rackspace".to_string(),
        )),
    }
}
