//! Transform engine
//!
//! Runs a profile against a staged working copy: reads the copy, applies the
//! operations in order and writes the result back to the same key.

use drive_core::{
    ContentType, DriveError, DriveResult, ImageOperation, Profile, StagedFile, IMAGE_VOCABULARY,
};
use drive_storage::Storage;
use std::sync::Arc;

/// What happened to a working copy when a profile was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOutcome {
    /// Content was rewritten after running this many operations
    Transformed { operations: usize },
    /// The profile has no operations; content was not touched
    Unchanged,
    /// The engine has no transformer for this content type; content was not touched
    Unsupported(ContentType),
}

#[derive(Clone)]
pub struct TransformEngine {
    storage: Arc<dyn Storage>,
}

impl TransformEngine {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Operation names the engine understands for a content type
    pub fn vocabulary(content_type: ContentType) -> &'static [&'static str] {
        match content_type {
            ContentType::Image if cfg!(feature = "image") => IMAGE_VOCABULARY,
            _ => &[],
        }
    }

    pub fn supports(content_type: ContentType) -> bool {
        !Self::vocabulary(content_type).is_empty()
    }

    /// Apply a configured profile to `staged`.
    ///
    /// Returns [`DriveError::UnreadableContent`] when the copy cannot be decoded
    /// and [`DriveError::Transform`] when a step fails on decodable content.
    pub async fn apply(
        &self,
        staged: &StagedFile,
        profile_name: &str,
        profile: &Profile,
    ) -> DriveResult<TransformOutcome> {
        if !Self::supports(profile.content_type) {
            tracing::info!(
                profile = %profile_name,
                content_type = %profile.content_type,
                "No transformer for content type, profile skipped"
            );
            return Ok(TransformOutcome::Unsupported(profile.content_type));
        }

        let operations = profile
            .operations
            .iter()
            .enumerate()
            .map(|(position, step)| {
                ImageOperation::parse(step).map_err(|e| DriveError::Transform {
                    profile: profile_name.to_string(),
                    operation: step.name.clone(),
                    position,
                    reason: e.to_string(),
                })
            })
            .collect::<DriveResult<Vec<_>>>()?;

        self.apply_image(staged, profile_name, &operations).await
    }

    /// Apply already-validated image operations to `staged`.
    pub async fn apply_image(
        &self,
        staged: &StagedFile,
        profile_name: &str,
        operations: &[ImageOperation],
    ) -> DriveResult<TransformOutcome> {
        if !Self::supports(ContentType::Image) {
            tracing::info!(
                profile = %profile_name,
                operations = operations.len(),
                "No image transformer, profile skipped"
            );
            return Ok(TransformOutcome::Unsupported(ContentType::Image));
        }
        if operations.is_empty() {
            return Ok(TransformOutcome::Unchanged);
        }

        #[cfg(feature = "image")]
        let outcome = self.rewrite(staged, profile_name, operations).await;
        #[cfg(not(feature = "image"))]
        let outcome = Ok(TransformOutcome::Unsupported(ContentType::Image));
        outcome
    }

    #[cfg(feature = "image")]
    async fn rewrite(
        &self,
        staged: &StagedFile,
        profile_name: &str,
        operations: &[ImageOperation],
    ) -> DriveResult<TransformOutcome> {
        let data = self
            .storage
            .read(&staged.key)
            .await
            .map_err(|e| DriveError::Staging(format!("Working copy unavailable: {e}")))?;

        let start = std::time::Instant::now();
        let output = self.run_image(data, profile_name, operations).await?;

        let count = operations.len();
        self.storage
            .write(&staged.key, output)
            .await
            .map_err(|e| DriveError::Staging(format!("Failed to write working copy: {e}")))?;

        tracing::info!(
            profile = %profile_name,
            token = %staged.token,
            operations = count,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Profile applied"
        );

        Ok(TransformOutcome::Transformed { operations: count })
    }

    #[cfg(feature = "image")]
    async fn run_image(
        &self,
        data: Vec<u8>,
        profile_name: &str,
        operations: &[ImageOperation],
    ) -> DriveResult<Vec<u8>> {
        use crate::image::transformer::{ImageError, StepError};
        use crate::image::ImageTransformer;

        let ops = operations.to_vec();
        // Image decode is CPU-bound; run off the async pool to avoid blocking other tasks.
        let result = tokio::task::spawn_blocking(move || ImageTransformer::transform(&data, &ops))
            .await
            .map_err(|e| DriveError::Staging(format!("Image worker failed: {e}")))?;

        result.map_err(|StepError { position, error }| match error {
            ImageError::Unreadable(reason) => DriveError::UnreadableContent(reason),
            ImageError::Operation(reason) => {
                let position = position.unwrap_or_default();
                DriveError::Transform {
                    profile: profile_name.to_string(),
                    operation: operations
                        .get(position)
                        .map(|op| op.name().to_string())
                        .unwrap_or_default(),
                    position,
                    reason,
                }
            }
            ImageError::Encode(reason) => DriveError::Transform {
                profile: profile_name.to_string(),
                operation: "encode".to_string(),
                position: operations.len(),
                reason,
            },
        })
    }
}
