//! Drive Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and
//! destination path template shared by every Drive component.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod template;

// Re-export commonly used types
pub use config::{load_config, load_config_from_str, DiskConfig, DriveConfig, ProfileConfig};
pub use error::{ConfigError, DriveError, DriveResult, ErrorMetadata, LogLevel};
pub use models::{
    ContentType, FlipAxis, ImageOperation, InboundFile, OperationSpec, Profile, StagedFile,
    IMAGE_VOCABULARY, MAX_EDGE, MAX_PIXELS,
};
pub use storage_types::DiskDriver;
pub use template::PathTemplate;

/// Name under which the dynamically built profile is reported in logs and errors.
pub const EDITING_PROFILE: &str = "editing";
