//! Drive Storage Library
//!
//! This crate provides the namespace abstraction Drive stages and commits
//! through: the `Storage` trait plus local filesystem and S3 backends.
//!
//! # Key format
//!
//! Keys are `/`-separated and relative to the disk root, e.g.
//! `temp/{session}/{token}` or `files/2024/7/photo.jpg`. Keys must not
//! contain `..` or a leading `/`. Use [`join_key`] to build them.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{join_key, split_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
