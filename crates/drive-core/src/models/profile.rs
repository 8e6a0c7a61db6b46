//! Transformation profile models

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Kind of content a profile targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Video,
    Audio,
    Document,
}

impl ContentType {
    /// Classify a MIME type. Anything that is not image, video or audio is a document.
    pub fn from_mime(mime: &str) -> Self {
        let top = mime
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        match top.as_str() {
            "image" => ContentType::Image,
            "video" => ContentType::Video,
            "audio" => ContentType::Audio,
            _ => ContentType::Document,
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ContentType::Image => write!(f, "image"),
            ContentType::Video => write!(f, "video"),
            ContentType::Audio => write!(f, "audio"),
            ContentType::Document => write!(f, "document"),
        }
    }
}

/// One step of a profile: an operation name and its positional parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

impl OperationSpec {
    pub fn new(name: impl Into<String>, params: Vec<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// A named, ordered list of operations plus the content type they target.
///
/// An empty operation list is valid and leaves content untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default)]
    pub operations: Vec<OperationSpec>,
}

impl Profile {
    pub fn new(content_type: ContentType, operations: Vec<OperationSpec>) -> Self {
        Self {
            content_type,
            operations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
