use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

/// Disk driver resolved from the `[disk]` configuration section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskDriver {
    Local {
        root: PathBuf,
    },
    S3 {
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
    },
    Rackspace {
        container: String,
    },
}

impl DiskDriver {
    /// Root identifier of the namespace: a directory for local disks,
    /// a bucket or container name for remote ones.
    pub fn root(&self) -> String {
        match self {
            DiskDriver::Local { root } => root.display().to_string(),
            DiskDriver::S3 { bucket, .. } => bucket.clone(),
            DiskDriver::Rackspace { container } => container.clone(),
        }
    }
}

impl Display for DiskDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DiskDriver::Local { .. } => write!(f, "local"),
            DiskDriver::S3 { .. } => write!(f, "s3"),
            DiskDriver::Rackspace { .. } => write!(f, "rackspace"),
        }
    }
}
