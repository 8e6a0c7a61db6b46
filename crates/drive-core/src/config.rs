//! Configuration module
//!
//! Drive is configured from a TOML file with `DRIVE_`-prefixed environment
//! overrides (nested keys separated by `__`, e.g. `DRIVE_DISK__ROOT`).
//!
//! ```toml
//! location = "files"
//! temporary = "temp"
//! structure = "{year}/{month}/{name}.{ext}"
//! rules = ["max:2048"]
//!
//! [disk]
//! driver = "local"
//! root = "/var/lib/drive"
//!
//! [default_profiles]
//! image = ["avatar"]
//!
//! [profiles.avatar]
//! type = "image"
//! operations = [
//!     { name = "crop", params = [100, 100, 25, 25] },
//!     { name = "heighten", params = [200] },
//! ]
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, DriveError, DriveResult};
use crate::models::{ContentType, ImageOperation, Profile};
use crate::storage_types::DiskDriver;
use crate::template::PathTemplate;
use crate::EDITING_PROFILE;

const DEFAULT_LOCATION: &str = "files";
const DEFAULT_TEMPORARY: &str = "temp";
const DEFAULT_STRUCTURE: &str = "{year}/{month}/{name}.{ext}";

pub type ProfileConfig = Profile;

#[derive(Clone, Debug, Deserialize)]
pub struct DriveConfig {
    /// Final namespace, relative to the disk root
    #[serde(default = "default_location")]
    pub location: String,
    /// Scratch namespace, relative to the disk root
    #[serde(default = "default_temporary", alias = "temp")]
    pub temporary: String,
    /// Destination path template
    #[serde(default = "default_structure")]
    pub structure: String,
    /// Validation rules applied to every inbound file
    #[serde(default)]
    pub rules: Vec<String>,
    /// Content type (`image`, `video`, ...) to profile names applied when none are requested
    #[serde(default)]
    pub default_profiles: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
    pub disk: DiskConfig,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_temporary() -> String {
    DEFAULT_TEMPORARY.to_string()
}

fn default_structure() -> String {
    DEFAULT_STRUCTURE.to_string()
}

/// Raw disk descriptor. Which fields are required depends on `driver`.
#[derive(Clone, Debug, Deserialize)]
pub struct DiskConfig {
    pub driver: String,
    pub root: Option<PathBuf>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub container: Option<String>,
}

impl DiskConfig {
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            driver: "local".to_string(),
            root: Some(root.into()),
            bucket: None,
            region: None,
            endpoint: None,
            container: None,
        }
    }

    pub fn resolve(&self) -> DriveResult<DiskDriver> {
        let missing = |field: &str| {
            DriveError::Config(ConfigError::ParseError(format!(
                "disk.{field} is required for the {} driver",
                self.driver
            )))
        };

        match self.driver.to_lowercase().as_str() {
            "local" => Ok(DiskDriver::Local {
                root: self.root.clone().ok_or_else(|| missing("root"))?,
            }),
            "s3" => Ok(DiskDriver::S3 {
                bucket: self.bucket.clone().ok_or_else(|| missing("bucket"))?,
                region: self.region.clone(),
                endpoint: self.endpoint.clone(),
            }),
            "rackspace" => Ok(DiskDriver::Rackspace {
                container: self.container.clone().ok_or_else(|| missing("container"))?,
            }),
            other => Err(DriveError::UnsupportedDriver(other.to_string())),
        }
    }
}

impl DriveConfig {
    /// Minimal configuration over a local disk, used by tests and embedding callers.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            location: default_location(),
            temporary: default_temporary(),
            structure: default_structure(),
            rules: Vec::new(),
            default_profiles: BTreeMap::new(),
            profiles: BTreeMap::new(),
            disk: DiskConfig::local(root),
        }
    }

    pub fn template(&self) -> DriveResult<PathTemplate> {
        PathTemplate::parse(self.structure.clone())
    }

    /// Startup checks; everything here is an operator error rather than a per-upload one.
    pub fn validate(&self) -> DriveResult<()> {
        self.template()?;
        self.disk.resolve()?;

        for (name, profile) in &self.profiles {
            if name == EDITING_PROFILE {
                return Err(ConfigError::ReservedProfileName(name.clone()).into());
            }
            if profile.content_type == ContentType::Image {
                for step in &profile.operations {
                    ImageOperation::parse(step)?;
                }
            }
        }

        for (content_type, names) in &self.default_profiles {
            for name in names {
                if !self.profiles.contains_key(name) {
                    return Err(ConfigError::UnknownDefaultProfile {
                        content_type: content_type.clone(),
                        name: name.clone(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<DriveConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("DRIVE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from a TOML string
pub fn load_config_from_str(toml_str: &str) -> Result<DriveConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
