//! Drive Services Layer
//!
//! Upload orchestration on top of storage and processing:
//! - `ProfileStore` / `EditingProfileBuilder` decide which operations run
//! - `StagingArea` keeps scratch copies out of the final namespace
//! - `DestinationNamer` finds a free destination path
//! - `UploadSession` drives one upload from staging to commit
//! - `Drive` builds sessions from configuration

pub mod destination;
pub mod drive;
pub mod profiles;
pub mod session;
pub mod staging;

pub use destination::DestinationNamer;
pub use drive::Drive;
pub use profiles::{EditingProfileBuilder, ProfileRef, ProfileStore};
pub use session::{SessionState, UploadSession};
pub use staging::StagingArea;

pub use drive_core::{
    load_config, ContentType, DriveConfig, DriveError, DriveResult, ErrorMetadata, FlipAxis,
    InboundFile, OperationSpec,
};
pub use drive_processing::{RuleValidator, TransformEngine, TransformOutcome, Validator};
#[cfg(feature = "storage-local")]
pub use drive_storage::LocalStorage;
pub use drive_storage::{create_storage, Storage, StorageError, StorageResult};
