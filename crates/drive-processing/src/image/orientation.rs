use drive_core::FlipAxis;
use image::{DynamicImage, Rgba};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Image orientation operations (rotation and flipping)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Rotate clockwise by `degrees`.
    ///
    /// Right angles are exact and swap dimensions where needed. Any other angle
    /// rotates about the centre on the same canvas, filling uncovered corners
    /// with transparent pixels.
    pub fn rotate_by_angle(img: DynamicImage, degrees: f32) -> DynamicImage {
        let normalized = degrees.rem_euclid(360.0);
        match normalized {
            a if a == 0.0 => img,
            a if a == 90.0 => img.rotate90(),
            a if a == 180.0 => img.rotate180(),
            a if a == 270.0 => img.rotate270(),
            a => {
                tracing::debug!(degrees = a, "Rotating about centre");
                DynamicImage::ImageRgba8(rotate_about_center(
                    &img.to_rgba8(),
                    a.to_radians(),
                    Interpolation::Bilinear,
                    Rgba([0, 0, 0, 0]),
                ))
            }
        }
    }

    pub fn flip(img: DynamicImage, axis: FlipAxis) -> DynamicImage {
        match axis {
            FlipAxis::Horizontal => img.fliph(),
            FlipAxis::Vertical => img.flipv(),
        }
    }
}
