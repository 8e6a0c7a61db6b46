//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use drive_core::DriveError;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Move failed: {0}")]
    MoveFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not supported disk driver for upload: {0}")]
    UnsupportedDriver(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for DriveError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedDriver(driver) => DriveError::UnsupportedDriver(driver),
            other => DriveError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// Staging and commit only ever talk to a namespace through this trait, so
/// the upload flow works unchanged over a local directory or a bucket.
/// Every key is relative to the disk root.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check if a file exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Move a file from one key to another, replacing the target
    async fn rename(&self, from_key: &str, to_key: &str) -> StorageResult<()>;

    /// Copy a file from one key to another, replacing the target
    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()>;

    /// Ensure a directory exists. Backends without directories treat this as a no-op.
    async fn make_directory(&self, key: &str) -> StorageResult<()>;

    /// Delete a directory and everything under it. Missing directories are not an error.
    async fn delete_directory(&self, key: &str) -> StorageResult<()>;

    /// Move a file from the local filesystem (outside the namespace) to `key`
    async fn import(&self, source: &Path, key: &str) -> StorageResult<()>;

    /// Read a whole file
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Write a whole file, replacing any existing content
    async fn write(&self, key: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Name of the disk driver backing this storage
    fn driver(&self) -> &'static str;
}
