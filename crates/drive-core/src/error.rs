//! Error types module
//!
//! Every failure a session can surface is a `DriveError` variant. Configuration
//! loading has its own `ConfigError`, wrapped by `DriveError::Config`.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported to callers and operators
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STAGING_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the caller may retry or fix input and try again
    fn is_recoverable(&self) -> bool;

    /// Whether the error points at operator configuration rather than input
    fn is_configuration(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Profile name [{0}] is reserved and cannot be configured")]
    ReservedProfileName(String),

    #[error("Default profile [{name}] for {content_type} does not exist")]
    UnknownDefaultProfile { content_type: String, name: String },

    #[error("Invalid validation rule: {0}")]
    InvalidRule(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Staging failed: {0}")]
    Staging(String),

    #[error("Profile [{0}] does not exist")]
    UnknownProfile(String),

    #[error("Content is not readable: {0}")]
    UnreadableContent(String),

    #[error("Operation `{operation}` at position {position} of profile [{profile}] failed: {reason}")]
    Transform {
        profile: String,
        operation: String,
        position: usize,
        reason: String,
    },

    #[error("Invalid operation `{operation}`: {reason}")]
    InvalidOperation { operation: String, reason: String },

    #[error("File structure [{0}] invalid: it must contain {{name}}")]
    InvalidTemplate(String),

    #[error("Not supported disk driver for upload: {0}")]
    UnsupportedDriver(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type DriveResult<T> = Result<T, DriveError>;

/// Static metadata for each variant: (error_code, recoverable, configuration, log_level).
fn drive_error_static_metadata(err: &DriveError) -> (&'static str, bool, bool, LogLevel) {
    match err {
        DriveError::Validation(_) => ("VALIDATION_ERROR", true, false, LogLevel::Debug),
        DriveError::Staging(_) => ("STAGING_ERROR", false, false, LogLevel::Error),
        DriveError::UnknownProfile(_) => ("UNKNOWN_PROFILE", false, true, LogLevel::Warn),
        DriveError::UnreadableContent(_) => ("UNREADABLE_CONTENT", true, false, LogLevel::Warn),
        DriveError::Transform { .. } => ("TRANSFORM_ERROR", false, false, LogLevel::Warn),
        DriveError::InvalidOperation { .. } => ("INVALID_OPERATION", false, true, LogLevel::Error),
        DriveError::InvalidTemplate(_) => ("INVALID_TEMPLATE", false, true, LogLevel::Error),
        DriveError::UnsupportedDriver(_) => ("UNSUPPORTED_DRIVER", false, true, LogLevel::Error),
        DriveError::Config(_) => ("CONFIG_ERROR", false, true, LogLevel::Error),
        DriveError::Storage(_) => ("STORAGE_ERROR", true, false, LogLevel::Error),
    }
}

impl ErrorMetadata for DriveError {
    fn error_code(&self) -> &'static str {
        drive_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        drive_error_static_metadata(self).1
    }

    fn is_configuration(&self) -> bool {
        drive_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        drive_error_static_metadata(self).3
    }
}
