//! Inbound file validation
//!
//! Rules are declared as strings in configuration (`max:2048`, `mimes:jpg,png`)
//! and parsed once at startup into [`Rule`] values.

use drive_core::{ConfigError, ContentType, DriveError, DriveResult, InboundFile};

/// Checks an inbound file before anything is staged
pub trait Validator: Send + Sync {
    fn validate(&self, file: &InboundFile) -> DriveResult<()>;
}

/// Common validation errors for inbound files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size_kb} KB (max: {max_kb} KB)")]
    FileTooLarge { size_kb: u64, max_kb: u64 },

    #[error("File too small: {size_kb} KB (min: {min_kb} KB)")]
    FileTooSmall { size_kb: u64, min_kb: u64 },

    #[error("Invalid file extension: {extension:?} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("File must be an image, got {0}")]
    NotAnImage(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// `max:<kilobytes>`
    MaxKilobytes(u64),
    /// `min:<kilobytes>`
    MinKilobytes(u64),
    /// `mimes:<ext>,<ext>` matched against the client filename extension
    Mimes(Vec<String>),
    /// `mimetypes:<type>,<type>`; a `type/*` entry matches the whole family
    MimeTypes(Vec<String>),
    /// `image`
    Image,
}

impl Rule {
    pub fn parse(rule: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidRule(rule.to_string());
        let (name, arg) = match rule.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (rule.trim(), None),
        };

        let list = |arg: Option<&str>| -> Result<Vec<String>, ConfigError> {
            let items: Vec<String> = arg
                .ok_or_else(invalid)?
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            if items.is_empty() {
                return Err(invalid());
            }
            Ok(items)
        };

        match (name.to_lowercase().as_str(), arg) {
            ("max", Some(kb)) => kb.parse().map(Rule::MaxKilobytes).map_err(|_| invalid()),
            ("min", Some(kb)) => kb.parse().map(Rule::MinKilobytes).map_err(|_| invalid()),
            ("mimes", arg) => list(arg).map(Rule::Mimes),
            ("mimetypes", arg) => list(arg).map(Rule::MimeTypes),
            ("image", None) => Ok(Rule::Image),
            _ => Err(invalid()),
        }
    }

    pub fn check(&self, file: &InboundFile) -> Result<(), ValidationError> {
        let size_kb = file.size_bytes().div_ceil(1024);

        match self {
            Rule::MaxKilobytes(max_kb) if size_kb > *max_kb => Err(ValidationError::FileTooLarge {
                size_kb,
                max_kb: *max_kb,
            }),
            Rule::MinKilobytes(min_kb) if size_kb < *min_kb => Err(ValidationError::FileTooSmall {
                size_kb,
                min_kb: *min_kb,
            }),
            Rule::Mimes(allowed) => {
                let extension = file.extension().to_lowercase();
                let matches = allowed.iter().any(|ext| {
                    ext == &extension || (ext == "jpg" && extension == "jpeg")
                        || (ext == "jpeg" && extension == "jpg")
                });
                if matches {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidExtension {
                        extension,
                        allowed: allowed.clone(),
                    })
                }
            }
            Rule::MimeTypes(allowed) => {
                let mime = file.mime_type().trim().to_lowercase();
                let family = mime.split('/').next().unwrap_or_default();
                let matches = allowed.iter().any(|candidate| match candidate.strip_suffix("/*") {
                    Some(prefix) => prefix == family,
                    None => candidate == &mime,
                });
                if matches {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidContentType {
                        content_type: file.mime_type().to_string(),
                        allowed: allowed.clone(),
                    })
                }
            }
            Rule::Image if file.content_type() != ContentType::Image => {
                Err(ValidationError::NotAnImage(file.mime_type().to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Validator built from the configured rule strings; every rule must pass
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    rules: Vec<Rule>,
}

impl RuleValidator {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn from_rules<S: AsRef<str>>(rules: &[S]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(|rule| Rule::parse(rule.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl Validator for RuleValidator {
    fn validate(&self, file: &InboundFile) -> DriveResult<()> {
        let failures: Vec<String> = self
            .rules
            .iter()
            .filter_map(|rule| rule.check(file).err())
            .map(|e| e.to_string())
            .collect();

        if failures.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            file = %file.original_name(),
            failures = failures.len(),
            "Inbound file rejected"
        );
        Err(DriveError::Validation(failures))
    }
}
