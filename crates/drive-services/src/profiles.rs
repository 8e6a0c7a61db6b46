//! Profile resolution
//!
//! Static profiles come from configuration and are shared read-only across
//! sessions. The editing profile is per-session and is built explicitly with
//! [`EditingProfileBuilder`].

use drive_core::{
    ContentType, DriveConfig, DriveError, DriveResult, FlipAxis, ImageOperation, OperationSpec,
    Profile, EDITING_PROFILE,
};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

/// A profile queued on a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileRef {
    /// A profile from configuration
    Named(String),
    /// The session's own editing profile
    Editing,
}

impl ProfileRef {
    pub fn name(&self) -> &str {
        match self {
            ProfileRef::Named(name) => name,
            ProfileRef::Editing => EDITING_PROFILE,
        }
    }
}

impl Display for ProfileRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Read-only view over the configured profiles and per-type defaults
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profiles: Arc<BTreeMap<String, Profile>>,
    defaults: Arc<BTreeMap<String, Vec<String>>>,
}

impl ProfileStore {
    pub fn new(
        profiles: BTreeMap<String, Profile>,
        defaults: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            profiles: Arc::new(profiles),
            defaults: Arc::new(defaults),
        }
    }

    pub fn from_config(config: &DriveConfig) -> Self {
        Self::new(config.profiles.clone(), config.default_profiles.clone())
    }

    pub fn all_profiles(&self) -> &BTreeMap<String, Profile> {
        &self.profiles
    }

    /// Profiles applied when a session queued none, in configured order
    pub fn default_profiles_for(&self, content_type: ContentType) -> Vec<ProfileRef> {
        self.defaults
            .get(&content_type.to_string())
            .map(|names| names.iter().cloned().map(ProfileRef::Named).collect())
            .unwrap_or_default()
    }

    pub fn resolve(&self, name: &str) -> DriveResult<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| DriveError::UnknownProfile(name.to_string()))
    }
}

/// Builds the editing profile one operation at a time.
///
/// Methods chain. A step that fails validation is not recorded; the first
/// such failure is kept and reported when the profile is consumed.
#[derive(Debug, Default)]
pub struct EditingProfileBuilder {
    operations: Vec<ImageOperation>,
    error: Option<DriveError>,
}

impl EditingProfileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(&self) -> ContentType {
        ContentType::Image
    }

    pub fn crop(&mut self, width: u32, height: u32, x: u32, y: u32) -> &mut Self {
        self.push(ImageOperation::Crop {
            width,
            height,
            offset: Some((x, y)),
        })
    }

    /// Crop around the image centre
    pub fn crop_centre(&mut self, width: u32, height: u32) -> &mut Self {
        self.push(ImageOperation::Crop {
            width,
            height,
            offset: None,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> &mut Self {
        self.push(ImageOperation::Resize { width, height })
    }

    pub fn heighten(&mut self, height: u32) -> &mut Self {
        self.push(ImageOperation::Heighten { height })
    }

    pub fn widen(&mut self, width: u32) -> &mut Self {
        self.push(ImageOperation::Widen { width })
    }

    pub fn fit(&mut self, width: u32, height: u32) -> &mut Self {
        self.push(ImageOperation::Fit { width, height })
    }

    pub fn blur(&mut self, sigma: f32) -> &mut Self {
        self.push(ImageOperation::Blur { sigma })
    }

    pub fn sharpen(&mut self, sigma: f32, threshold: i32) -> &mut Self {
        self.push(ImageOperation::Sharpen { sigma, threshold })
    }

    pub fn rotate(&mut self, degrees: f32) -> &mut Self {
        self.push(ImageOperation::Rotate { degrees })
    }

    pub fn flip(&mut self, axis: FlipAxis) -> &mut Self {
        self.push(ImageOperation::Flip(axis))
    }

    pub fn greyscale(&mut self) -> &mut Self {
        self.push(ImageOperation::Greyscale)
    }

    pub fn invert(&mut self) -> &mut Self {
        self.push(ImageOperation::Invert)
    }

    pub fn brightness(&mut self, level: i32) -> &mut Self {
        self.push(ImageOperation::Brightness { level })
    }

    pub fn contrast(&mut self, level: f32) -> &mut Self {
        self.push(ImageOperation::Contrast { level })
    }

    pub fn colorize(&mut self, red: i32, green: i32, blue: i32) -> &mut Self {
        self.push(ImageOperation::Colorize { red, green, blue })
    }

    /// Append a step by name, as it would appear in a configured profile.
    pub fn add_operation(&mut self, step: &OperationSpec) -> &mut Self {
        match ImageOperation::parse(step) {
            Ok(op) => self.operations.push(op),
            Err(e) => self.record_error(e),
        }
        self
    }

    pub fn operations(&self) -> &[ImageOperation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.error.is_none()
    }

    /// The recorded steps in configured-profile form
    pub fn to_profile(&self) -> Profile {
        Profile::new(
            self.content_type(),
            self.operations.iter().map(ImageOperation::to_spec).collect(),
        )
    }

    /// Consume the builder, failing with the first rejected step if there was one.
    pub fn finish(self) -> DriveResult<Vec<ImageOperation>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.operations),
        }
    }

    fn push(&mut self, op: ImageOperation) -> &mut Self {
        // Typed values still go through the range checks of the named form.
        match ImageOperation::parse(&op.to_spec()) {
            Ok(_) => self.operations.push(op),
            Err(e) => self.record_error(e),
        }
        self
    }

    fn record_error(&mut self, error: DriveError) {
        tracing::debug!(error = %error, "Editing step rejected");
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> ProfileStore {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "avatar".to_string(),
            Profile::new(
                ContentType::Image,
                vec![OperationSpec::new("crop", vec![json!(100), json!(100)])],
            ),
        );
        profiles.insert("raw".to_string(), Profile::new(ContentType::Image, Vec::new()));

        let mut defaults = BTreeMap::new();
        defaults.insert(
            "image".to_string(),
            vec!["raw".to_string(), "avatar".to_string()],
        );
        ProfileStore::new(profiles, defaults)
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let store = store();
        assert_eq!(store.resolve("avatar").unwrap().operations.len(), 1);
        assert!(matches!(
            store.resolve("thumb"),
            Err(DriveError::UnknownProfile(name)) if name == "thumb"
        ));
        assert_eq!(store.all_profiles().len(), 2);
    }

    #[test]
    fn test_default_profiles_keep_order() {
        let store = store();
        assert_eq!(
            store.default_profiles_for(ContentType::Image),
            vec![
                ProfileRef::Named("raw".to_string()),
                ProfileRef::Named("avatar".to_string())
            ]
        );
        assert!(store.default_profiles_for(ContentType::Video).is_empty());
    }

    #[test]
    fn test_builder_records_in_call_order() {
        let mut builder = EditingProfileBuilder::new();
        builder.crop(10, 10, 0, 0).rotate(90.0).greyscale();

        let names: Vec<_> = builder.operations().iter().map(|op| op.name()).collect();
        assert_eq!(names, ["crop", "rotate", "greyscale"]);

        let profile = builder.to_profile();
        assert_eq!(profile.content_type, ContentType::Image);
        assert_eq!(profile.operations[0].params, vec![json!(10), json!(10), json!(0), json!(0)]);
    }

    #[test]
    fn test_builder_add_operation_by_name() {
        let mut builder = EditingProfileBuilder::new();
        builder.add_operation(&OperationSpec::new("heighten", vec![json!(200)]));
        assert_eq!(
            builder.finish().unwrap(),
            vec![ImageOperation::Heighten { height: 200 }]
        );
    }

    #[test]
    fn test_builder_keeps_first_error() {
        let mut builder = EditingProfileBuilder::new();
        builder
            .brightness(500)
            .add_operation(&OperationSpec::new("explode", Vec::new()))
            .invert();

        assert_eq!(builder.operations(), [ImageOperation::Invert]);
        assert!(!builder.is_empty());
        match builder.finish() {
            Err(DriveError::InvalidOperation { operation, .. }) => {
                assert_eq!(operation, "brightness")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_profile_ref_names() {
        assert_eq!(ProfileRef::Editing.name(), "editing");
        assert_eq!(ProfileRef::Named("avatar".to_string()).to_string(), "avatar");
    }
}
