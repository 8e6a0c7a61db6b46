//! Destination path template
//!
//! Templates such as `{year}/{month}/{name}.{ext}` are expanded in a single
//! pass, so a filename that itself contains `{ext}` is never re-expanded.

use chrono::{DateTime, Datelike, Utc};

use crate::error::{DriveError, DriveResult};

const NAME: &str = "{name}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate(String);

impl PathTemplate {
    /// `{name}` is mandatory; `{year}`, `{month}` and `{ext}` are optional.
    pub fn parse(template: impl Into<String>) -> DriveResult<Self> {
        let template = template.into();
        if !template.contains(NAME) {
            return Err(DriveError::InvalidTemplate(template));
        }
        Ok(Self(template))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Expand the template for `now`. The month is not zero-padded (`7`, not `07`).
    /// With an empty extension, `{ext}` also swallows the `.` right before it.
    pub fn expand(&self, now: DateTime<Utc>, name: &str, extension: &str) -> String {
        let mut out = String::with_capacity(self.0.len() + name.len() + extension.len());
        let mut rest = self.0.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            let (value, len) = if tail.starts_with("{year}") {
                (now.year().to_string(), "{year}".len())
            } else if tail.starts_with("{month}") {
                (now.month().to_string(), "{month}".len())
            } else if tail.starts_with(NAME) {
                (name.to_string(), NAME.len())
            } else if tail.starts_with("{ext}") {
                if extension.is_empty() && out.ends_with('.') {
                    out.pop();
                }
                (extension.to_string(), "{ext}".len())
            } else {
                ("{".to_string(), 1)
            };
            out.push_str(&value);
            rest = &tail[len..];
        }
        out.push_str(rest);
        out
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
