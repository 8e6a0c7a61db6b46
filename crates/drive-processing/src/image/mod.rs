//! Image processing module
//!
//! Pixel-level implementation of the image vocabulary:
//! - geometry and colour operations (transformer)
//! - rotation and flipping (orientation)

pub mod orientation;
pub mod transformer;

pub use orientation::ImageOrientation;
pub use transformer::ImageTransformer;
