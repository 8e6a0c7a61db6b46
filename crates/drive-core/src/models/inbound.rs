//! Inbound file reference handed over by the transport layer

use std::path::{Path, PathBuf};

use super::ContentType;

/// Used when the client sends no usable filename
const FALLBACK_NAME: &str = "upload";

/// A file received from a client, sitting at a local path until it is staged.
#[derive(Debug, Clone)]
pub struct InboundFile {
    path: PathBuf,
    original_name: String,
    mime_type: String,
    size_bytes: u64,
}

impl InboundFile {
    pub fn new(
        path: impl Into<PathBuf>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            path: path.into(),
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn content_type(&self) -> ContentType {
        ContentType::from_mime(&self.mime_type)
    }

    /// Last segment of the client filename. Clients may send directories with
    /// either separator; only the final component names the file.
    pub fn file_name(&self) -> &str {
        let name = self
            .original_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        match name {
            "" | "." | ".." => FALLBACK_NAME,
            name => name,
        }
    }

    /// Extension as supplied by the client, without the dot. Empty when there is none.
    pub fn extension(&self) -> &str {
        match self.file_name().rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext,
            _ => "",
        }
    }

    /// Client filename with its extension removed.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        }
    }
}
