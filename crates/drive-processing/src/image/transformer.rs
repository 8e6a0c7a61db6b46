//! Image transformer - decodes, applies vocabulary operations, re-encodes
//!
//! Work here is CPU-bound and synchronous; the engine runs it on the
//! blocking pool.

use drive_core::{ImageOperation, MAX_EDGE, MAX_PIXELS};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

use super::orientation::ImageOrientation;

/// Failure of a single image step, before it is tied to a profile position
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("{0}")]
    Unreadable(String),

    #[error("{0}")]
    Operation(String),

    #[error("{0}")]
    Encode(String),
}

pub struct ImageTransformer;

impl ImageTransformer {
    /// Decode image bytes, remembering the format so it can be written back the same way.
    pub fn decode(data: &[u8]) -> Result<(DynamicImage, ImageFormat), ImageError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ImageError::Unreadable(e.to_string()))?;
        let format = reader.format().unwrap_or(ImageFormat::Png);
        let img = reader
            .decode()
            .map_err(|e| ImageError::Unreadable(e.to_string()))?;
        Ok((img, format))
    }

    /// Encode in `format`, converting the pixel layout where the encoder requires it.
    pub fn encode(img: DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ImageError> {
        let img = Self::normalize_for(img, format);
        let (width, height) = img.dimensions();
        let hint = u64::from(width) * u64::from(height) * 3;
        let mut buffer = Vec::with_capacity(usize::try_from(hint).unwrap_or(0));
        img.write_to(&mut Cursor::new(&mut buffer), format)
            .map_err(|e| ImageError::Encode(e.to_string()))?;
        Ok(buffer)
    }

    fn normalize_for(img: DynamicImage, format: ImageFormat) -> DynamicImage {
        match format {
            // JPEG has no alpha channel
            ImageFormat::Jpeg => match img {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
                other => DynamicImage::ImageRgb8(other.to_rgb8()),
            },
            ImageFormat::WebP | ImageFormat::Gif => match img {
                DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
                other => DynamicImage::ImageRgba8(other.to_rgba8()),
            },
            _ => img,
        }
    }

    /// Apply a single operation
    pub fn apply(img: DynamicImage, op: &ImageOperation) -> Result<DynamicImage, ImageError> {
        let (width, height) = img.dimensions();

        let out = match *op {
            ImageOperation::Crop {
                width: crop_w,
                height: crop_h,
                offset,
            } => {
                if crop_w > width || crop_h > height {
                    return Err(ImageError::Operation(format!(
                        "crop {crop_w}x{crop_h} is larger than the {width}x{height} image"
                    )));
                }
                let (x, y) = offset.unwrap_or(((width - crop_w) / 2, (height - crop_h) / 2));
                if u64::from(x) + u64::from(crop_w) > u64::from(width)
                    || u64::from(y) + u64::from(crop_h) > u64::from(height)
                {
                    return Err(ImageError::Operation(format!(
                        "crop region {crop_w}x{crop_h} at ({x}, {y}) falls outside the {width}x{height} image"
                    )));
                }
                img.crop_imm(x, y, crop_w, crop_h)
            }
            ImageOperation::Resize {
                width: w,
                height: h,
            } => {
                let (w, h) = bounded(u64::from(w), u64::from(h))?;
                img.resize_exact(w, h, FilterType::Lanczos3)
            }
            ImageOperation::Heighten { height: h } => {
                let (w, h) = bounded(scaled(width, h, height), u64::from(h))?;
                img.resize_exact(w, h, FilterType::Lanczos3)
            }
            ImageOperation::Widen { width: w } => {
                let (w, h) = bounded(u64::from(w), scaled(height, w, width))?;
                img.resize_exact(w, h, FilterType::Lanczos3)
            }
            ImageOperation::Fit {
                width: w,
                height: h,
            } => {
                // the image is scaled to cover w x h before the crop
                let cover = (f64::from(w) / f64::from(width)).max(f64::from(h) / f64::from(height));
                bounded(
                    (f64::from(width) * cover).ceil() as u64,
                    (f64::from(height) * cover).ceil() as u64,
                )?;
                img.resize_to_fill(w, h, FilterType::Lanczos3)
            }
            ImageOperation::Blur { sigma } => {
                if sigma > 0.0 {
                    img.blur(sigma)
                } else {
                    img
                }
            }
            ImageOperation::Sharpen { sigma, threshold } => img.unsharpen(sigma, threshold),
            ImageOperation::Rotate { degrees } => ImageOrientation::rotate_by_angle(img, degrees),
            ImageOperation::Flip(axis) => ImageOrientation::flip(img, axis),
            ImageOperation::Greyscale => img.grayscale(),
            ImageOperation::Invert => {
                let mut img = img;
                img.invert();
                img
            }
            ImageOperation::Brightness { level } => img.brighten(level * 255 / 100),
            ImageOperation::Contrast { level } => img.adjust_contrast(level),
            ImageOperation::Colorize { red, green, blue } => colorize(&img, red, green, blue),
        };

        Ok(out)
    }

    /// Decode, run `operations` in order, and encode back in the source format.
    pub fn transform(data: &[u8], operations: &[ImageOperation]) -> Result<Vec<u8>, StepError> {
        let (mut img, format) =
            Self::decode(data).map_err(|e| StepError { position: None, error: e })?;

        for (position, op) in operations.iter().enumerate() {
            tracing::debug!(operation = op.name(), position, "Applying image operation");
            img = Self::apply(img, op).map_err(|e| StepError {
                position: Some(position),
                error: e,
            })?;
        }

        Self::encode(img, format).map_err(|e| StepError {
            position: None,
            error: e,
        })
    }
}

/// An [`ImageError`] with the index of the operation that raised it, if any
#[derive(Debug)]
pub struct StepError {
    pub position: Option<usize>,
    pub error: ImageError,
}

/// Scale `other` by `target / current`, never below one pixel.
fn scaled(other: u32, target: u32, current: u32) -> u64 {
    let value = (f64::from(other) * f64::from(target) / f64::from(current)).round();
    (value as u64).max(1)
}

/// Reject output sizes the pixel buffer could not reasonably hold.
fn bounded(width: u64, height: u64) -> Result<(u32, u32), ImageError> {
    let too_large = width > u64::from(MAX_EDGE)
        || height > u64::from(MAX_EDGE)
        || width.saturating_mul(height) > MAX_PIXELS;
    if too_large {
        return Err(ImageError::Operation(format!(
            "output of {width}x{height} exceeds the {MAX_EDGE} pixel edge or {MAX_PIXELS} pixel area limit"
        )));
    }
    Ok((width as u32, height as u32))
}

/// Shift each colour channel by a percentage of its full range.
fn colorize(img: &DynamicImage, red: i32, green: i32, blue: i32) -> DynamicImage {
    let shifts = [red * 255 / 100, green * 255 / 100, blue * 255 / 100];
    let mut buf = img.to_rgba8();
    for pixel in buf.pixels_mut() {
        for (channel, shift) in pixel.0.iter_mut().take(3).zip(shifts) {
            *channel = (i32::from(*channel) + shift).clamp(0, 255) as u8;
        }
    }
    DynamicImage::ImageRgba8(buf)
}
