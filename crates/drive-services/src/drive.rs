//! Drive facade
//!
//! Wires configuration, storage, validation and transforms together and
//! hands out one [`UploadSession`] per inbound file.

use drive_core::{DriveConfig, DriveResult, InboundFile};
use drive_processing::{RuleValidator, TransformEngine, Validator};
use drive_storage::{create_storage, Storage};
use std::sync::Arc;

use crate::destination::DestinationNamer;
use crate::profiles::ProfileStore;
use crate::session::UploadSession;

#[derive(Clone)]
pub struct Drive {
    storage: Arc<dyn Storage>,
    validator: Arc<dyn Validator>,
    profiles: ProfileStore,
    engine: TransformEngine,
    namer: DestinationNamer,
    temporary: String,
}

impl Drive {
    /// Validate `config` and connect to its disk. Configuration mistakes
    /// surface here rather than on the first upload.
    pub async fn from_config(config: DriveConfig) -> DriveResult<Self> {
        config.validate()?;

        let driver = config.disk.resolve()?;
        let storage = create_storage(&driver).await?;
        let validator = RuleValidator::from_rules(&config.rules)?;
        let namer = DestinationNamer::new(storage.clone(), config.location.clone(), config.template()?);

        tracing::info!(
            driver = %driver,
            root = %driver.root(),
            location = %config.location,
            temporary = %config.temporary,
            profiles = config.profiles.len(),
            rules = validator.rules().len(),
            "Drive initialized"
        );

        Ok(Self::new(
            storage,
            Arc::new(validator),
            ProfileStore::from_config(&config),
            namer,
            config.temporary,
        ))
    }

    pub fn new(
        storage: Arc<dyn Storage>,
        validator: Arc<dyn Validator>,
        profiles: ProfileStore,
        namer: DestinationNamer,
        temporary: impl Into<String>,
    ) -> Self {
        Self {
            engine: TransformEngine::new(storage.clone()),
            storage,
            validator,
            profiles,
            namer,
            temporary: temporary.into(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn namer(&self) -> &DestinationNamer {
        &self.namer
    }

    /// Validate an inbound file and open a session for it. Nothing is staged yet.
    pub fn accept(&self, inbound: InboundFile) -> DriveResult<UploadSession> {
        self.validator.validate(&inbound)?;

        Ok(UploadSession::new(
            inbound,
            self.storage.clone(),
            &self.temporary,
            self.profiles.clone(),
            self.engine.clone(),
            self.namer.clone(),
        ))
    }

    /// Accept, apply `profiles` (or the defaults when empty), save once and close.
    pub async fn store(
        &self,
        inbound: InboundFile,
        profiles: &[String],
        suffix: Option<&str>,
    ) -> DriveResult<Option<String>> {
        let session = self.accept(inbound)?;
        let profiles = profiles.to_vec();
        let suffix = suffix.map(str::to_string);

        session
            .scoped(move |session| {
                Box::pin(async move {
                    for name in profiles {
                        session.profile(name);
                    }
                    session.save(suffix.as_deref()).await
                })
            })
            .await
    }
}
