//! Destination naming
//!
//! Candidate paths come from the configured template. While a candidate is
//! taken, a random digit is appended to the name: `photo`, `photo-3`,
//! `photo-37`, ...
//!
//! Checking and committing are separate steps, so two sessions allocating the
//! same name concurrently can both see it as free.

use chrono::{DateTime, Utc};
use drive_core::{DriveResult, PathTemplate};
use drive_storage::{join_key, Storage};
use rand::Rng;
use std::sync::Arc;

#[derive(Clone)]
pub struct DestinationNamer {
    storage: Arc<dyn Storage>,
    location: String,
    template: PathTemplate,
}

impl DestinationNamer {
    pub fn new(storage: Arc<dyn Storage>, location: impl Into<String>, template: PathTemplate) -> Self {
        Self {
            storage,
            location: location.into(),
            template,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Storage key of a path returned by [`allocate`](Self::allocate)
    pub fn key_for(&self, path: &str) -> String {
        join_key(&[&self.location, path])
    }

    /// Find an unused path, relative to `location`, for a file named `stem.extension`.
    /// `suffix` is appended to the stem as-is.
    pub async fn allocate(
        &self,
        stem: &str,
        extension: &str,
        suffix: Option<&str>,
    ) -> DriveResult<String> {
        self.allocate_at(Utc::now(), stem, extension, suffix).await
    }

    pub async fn allocate_at(
        &self,
        now: DateTime<Utc>,
        stem: &str,
        extension: &str,
        suffix: Option<&str>,
    ) -> DriveResult<String> {
        let base = format!("{stem}{}", suffix.unwrap_or_default());

        let mut tail = String::new();
        let mut attempts = 0u32;
        loop {
            let name = format!("{base}{tail}");
            let path = self.template.expand(now, &name, extension);
            attempts += 1;

            if !self.storage.exists(&self.key_for(&path)).await? {
                tracing::debug!(path = %path, attempts, "Destination allocated");
                return Ok(path);
            }

            let digit = rand::rng().random_range(0..=9u8);
            if tail.is_empty() {
                tail = format!("-{digit}");
            } else {
                tail.push(char::from(b'0' + digit));
            }
        }
    }
}
