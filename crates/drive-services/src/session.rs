//! Upload session
//!
//! One session per inbound file. Profiles are queued with [`UploadSession::profile`]
//! and [`UploadSession::edit`]; [`UploadSession::save`] stages, transforms and
//! commits; [`UploadSession::close`] releases the scratch directory.
//!
//! Sessions dropped without `close` still release their scratch directory in
//! the background, provided a tokio runtime is available.

use drive_core::{
    DriveError, DriveResult, ErrorMetadata, ImageOperation, InboundFile, LogLevel, Profile,
    StagedFile,
};
use drive_processing::{TransformEngine, TransformOutcome};
use drive_storage::{split_key, Storage};
use futures::future::BoxFuture;
use std::sync::Arc;

use crate::destination::DestinationNamer;
use crate::profiles::{EditingProfileBuilder, ProfileRef, ProfileStore};
use crate::staging::StagingArea;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Validated, nothing staged yet
    Accepted,
    /// Original copy is in the scratch directory
    Staged,
    /// A working copy is being transformed
    Transforming,
    /// The working copy holds the bytes to commit
    Transformed,
    /// The last save placed its working copy in the final namespace
    Committed,
    /// The last save failed before commit
    Failed,
}

/// What a queued profile resolves to for one save call
enum Plan {
    Configured(Profile),
    Editing(Vec<ImageOperation>),
}

pub struct UploadSession {
    inbound: InboundFile,
    storage: Arc<dyn Storage>,
    profiles: ProfileStore,
    engine: TransformEngine,
    namer: DestinationNamer,
    staging: StagingArea,
    queue: Vec<ProfileRef>,
    editing: Option<EditingProfileBuilder>,
    state: SessionState,
}

impl UploadSession {
    pub fn new(
        inbound: InboundFile,
        storage: Arc<dyn Storage>,
        temporary: &str,
        profiles: ProfileStore,
        engine: TransformEngine,
        namer: DestinationNamer,
    ) -> Self {
        let staging = StagingArea::new(storage.clone(), temporary);
        tracing::info!(
            file = %inbound.original_name(),
            mime_type = %inbound.mime_type(),
            size_bytes = inbound.size_bytes(),
            scratch = %staging.dir(),
            "Upload accepted"
        );

        Self {
            inbound,
            storage,
            profiles,
            engine,
            namer,
            staging,
            queue: Vec::new(),
            editing: None,
            state: SessionState::Accepted,
        }
    }

    pub fn inbound(&self) -> &InboundFile {
        &self.inbound
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Profiles queued for the next save
    pub fn queued(&self) -> &[ProfileRef] {
        &self.queue
    }

    /// Queue a configured profile for the next save. May be called repeatedly.
    ///
    /// Queuing is meant for a session that is `Accepted` or `Staged`. After a
    /// save has committed or failed, queued profiles apply to the following
    /// save, which starts again from the original.
    pub fn profile(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if matches!(self.state, SessionState::Committed | SessionState::Failed) {
            tracing::debug!(
                profile = %name,
                state = ?self.state,
                "Profile queued after a finished save, applies to the next save"
            );
        }
        self.queue.push(ProfileRef::Named(name));
        self
    }

    /// Operations recorded here form the editing profile, applied at its queue
    /// position on the next save.
    pub fn edit(&mut self) -> &mut EditingProfileBuilder {
        if !self.queue.contains(&ProfileRef::Editing) {
            self.queue.push(ProfileRef::Editing);
        }
        self.editing.get_or_insert_with(EditingProfileBuilder::new)
    }

    /// Transform and commit the upload.
    ///
    /// Returns the destination path relative to `location`, or `None` when the
    /// final copy could not be written; calling `save` again retries. The queue
    /// and editing profile are cleared however this returns.
    pub async fn save(&mut self, suffix: Option<&str>) -> DriveResult<Option<String>> {
        let queue = std::mem::take(&mut self.queue);
        let editing = self.editing.take();

        let result = self.run_save(queue, editing, suffix).await;
        if let Err(e) = &result {
            self.state = SessionState::Failed;
            log_save_failure(e, self.inbound.original_name());
        }
        result
    }

    async fn run_save(
        &mut self,
        queue: Vec<ProfileRef>,
        editing: Option<EditingProfileBuilder>,
        suffix: Option<&str>,
    ) -> DriveResult<Option<String>> {
        let queue = if queue.is_empty() {
            self.profiles
                .default_profiles_for(self.inbound.content_type())
        } else {
            queue
        };
        let plans = self.resolve(queue, editing)?;

        self.staging.stage_original(&self.inbound).await?;
        self.state = SessionState::Staged;

        let working = self.staging.stage_working_copy().await?;
        self.state = SessionState::Transforming;

        for (profile, plan) in &plans {
            self.apply(&working, profile, plan).await?;
        }
        self.state = SessionState::Transformed;

        let path = self
            .namer
            .allocate(self.inbound.stem(), self.inbound.extension(), suffix)
            .await?;

        match self.commit(&working, &path).await {
            Ok(()) => {
                self.state = SessionState::Committed;
                tracing::info!(
                    file = %self.inbound.original_name(),
                    path = %path,
                    profiles = plans.len(),
                    "Upload committed"
                );
                Ok(Some(path))
            }
            Err(e) => {
                self.state = SessionState::Staged;
                tracing::warn!(error = %e, path = %path, "Upload commit failed");
                Ok(None)
            }
        }
    }

    /// Resolve every queued profile before anything touches storage.
    fn resolve(
        &self,
        queue: Vec<ProfileRef>,
        editing: Option<EditingProfileBuilder>,
    ) -> DriveResult<Vec<(ProfileRef, Plan)>> {
        let mut editing = editing;
        queue
            .into_iter()
            .map(|profile| {
                let plan = match &profile {
                    ProfileRef::Named(name) => Plan::Configured(self.profiles.resolve(name)?.clone()),
                    ProfileRef::Editing => Plan::Editing(match editing.take() {
                        Some(builder) => builder.finish()?,
                        None => Vec::new(),
                    }),
                };
                Ok::<_, DriveError>((profile, plan))
            })
            .collect()
    }

    async fn apply(&self, working: &StagedFile, profile: &ProfileRef, plan: &Plan) -> DriveResult<()> {
        let name = profile.name();
        let outcome = match plan {
            Plan::Configured(p) => self.engine.apply(working, name, p).await,
            Plan::Editing(ops) => self.engine.apply_image(working, name, ops).await,
        };

        match outcome {
            Ok(TransformOutcome::Transformed { .. } | TransformOutcome::Unchanged) => Ok(()),
            Ok(TransformOutcome::Unsupported(content_type)) => {
                tracing::debug!(
                    profile = %name,
                    content_type = %content_type,
                    "Profile has no transformer, skipped"
                );
                Ok(())
            }
            Err(DriveError::UnreadableContent(reason)) => {
                tracing::warn!(
                    profile = %name,
                    file = %self.inbound.original_name(),
                    reason = %reason,
                    "Content not readable, profile skipped"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn commit(&self, working: &StagedFile, path: &str) -> DriveResult<()> {
        let key = self.namer.key_for(path);
        let (directory, _) = split_key(&key);
        self.storage.make_directory(directory).await?;
        self.storage.copy(&working.key, &key).await?;
        Ok(())
    }

    /// Release the scratch directory. Only the first call does anything.
    pub async fn close(&mut self) {
        self.staging.cleanup().await;
    }

    /// Run `f` against the session and close it afterwards, whatever `f` returns.
    pub async fn scoped<T, F>(mut self, f: F) -> DriveResult<T>
    where
        F: for<'a> FnOnce(&'a mut UploadSession) -> BoxFuture<'a, DriveResult<T>>,
    {
        let result = f(&mut self).await;
        self.close().await;
        result
    }
}

fn log_save_failure(error: &DriveError, file: &str) {
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_code, file = %file, "Upload save failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_code, file = %file, "Upload save failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_code, file = %file, "Upload save failed");
        }
    }
}
