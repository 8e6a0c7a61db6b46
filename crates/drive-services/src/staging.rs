//! Temporary staging area
//!
//! Each session gets its own scratch directory `{temporary}/{session_id}`.
//! Both staged copies live there, so releasing the session is a single
//! directory delete.

use drive_core::{DriveError, DriveResult, InboundFile, StagedFile};
use drive_storage::{join_key, Storage};
use std::sync::Arc;
use uuid::Uuid;

pub struct StagingArea {
    storage: Arc<dyn Storage>,
    dir: String,
    original: Option<StagedFile>,
    released: bool,
}

impl StagingArea {
    pub fn new(storage: Arc<dyn Storage>, temporary: &str) -> Self {
        let dir = join_key(&[temporary, &Uuid::new_v4().to_string()]);
        Self {
            storage,
            dir,
            original: None,
            released: false,
        }
    }

    /// Scratch directory key of this session
    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn original(&self) -> Option<&StagedFile> {
        self.original.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn allocate(&self) -> StagedFile {
        let token = Uuid::new_v4().simple().to_string();
        StagedFile {
            key: join_key(&[&self.dir, &token]),
            token,
        }
    }

    /// Move the inbound file into the scratch directory. Only the first call
    /// moves anything; later calls return the existing copy.
    pub async fn stage_original(&mut self, inbound: &InboundFile) -> DriveResult<StagedFile> {
        if let Some(original) = &self.original {
            return Ok(original.clone());
        }
        if self.released {
            return Err(DriveError::Staging(
                "Staging area has already been released".to_string(),
            ));
        }

        self.storage
            .make_directory(&self.dir)
            .await
            .map_err(|e| DriveError::Staging(format!("Can not create [{}]: {e}", self.dir)))?;

        let staged = self.allocate();
        self.storage
            .import(inbound.path(), &staged.key)
            .await
            .map_err(|e| {
                DriveError::Staging(format!(
                    "Can not move [{}] to [{}]: {e}",
                    inbound.path().display(),
                    staged.key
                ))
            })?;

        tracing::debug!(
            file = %inbound.original_name(),
            key = %staged.key,
            "Original staged"
        );

        self.original = Some(staged.clone());
        Ok(staged)
    }

    /// Fresh copy of the original for one save call to transform
    pub async fn stage_working_copy(&self) -> DriveResult<StagedFile> {
        let original = self.original.as_ref().ok_or_else(|| {
            DriveError::Staging("No original has been staged for editing".to_string())
        })?;

        let working = self.allocate();
        self.storage
            .copy(&original.key, &working.key)
            .await
            .map_err(|e| {
                DriveError::Staging(format!(
                    "Can not copy file [{}] for editing: {e}",
                    original.key
                ))
            })?;

        tracing::debug!(key = %working.key, "Working copy staged");
        Ok(working)
    }

    /// Delete the scratch directory. Runs once; failures are logged only.
    pub async fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match self.storage.delete_directory(&self.dir).await {
            Ok(()) => tracing::debug!(dir = %self.dir, "Staging area cleaned up"),
            Err(e) => tracing::error!(
                error = %e,
                dir = %self.dir,
                "Failed to clean up staging area"
            ),
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let storage = self.storage.clone();
        let dir = std::mem::take(&mut self.dir);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = storage.delete_directory(&dir).await {
                        tracing::error!(
                            error = %e,
                            dir = %dir,
                            "Failed to clean up abandoned staging area"
                        );
                    }
                });
            }
            Err(_) => tracing::warn!(
                dir = %dir,
                "Staging area dropped outside a runtime, scratch files left behind"
            ),
        }
    }
}
