//! Drive Processing Library
//!
//! Content transformations and upload validation:
//! - `TransformEngine` runs a profile against a staged working copy
//! - `image` holds the pixel-level implementation of the image vocabulary
//! - `validator` checks inbound files against the configured rules

pub mod engine;
#[cfg(feature = "image")]
pub mod image;
pub mod validator;

pub use engine::{TransformEngine, TransformOutcome};
#[cfg(feature = "image")]
pub use crate::image::ImageTransformer;
pub use validator::{Rule, RuleValidator, ValidationError, Validator};
