//! Image operation vocabulary
//!
//! Profiles name their steps as `(name, params)` pairs. Every image step is
//! parsed into an [`ImageOperation`] before anything runs, so a profile that
//! names an unknown verb or passes bad parameters is rejected up front.

use serde_json::Value;

use super::OperationSpec;
use crate::error::{DriveError, DriveResult};

/// Axis for the `flip` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// A single validated image edit
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOperation {
    /// Cut a `width`x`height` region whose top-left corner is at (`x`, `y`).
    /// Without an offset the region is centred.
    Crop {
        width: u32,
        height: u32,
        offset: Option<(u32, u32)>,
    },
    /// Resize to exact dimensions, ignoring aspect ratio
    Resize { width: u32, height: u32 },
    /// Resize to a height, keeping aspect ratio
    Heighten { height: u32 },
    /// Resize to a width, keeping aspect ratio
    Widen { width: u32 },
    /// Scale and crop to fill exactly `width`x`height`
    Fit { width: u32, height: u32 },
    Blur { sigma: f32 },
    Sharpen { sigma: f32, threshold: i32 },
    /// Clockwise rotation in degrees
    Rotate { degrees: f32 },
    Flip(FlipAxis),
    Greyscale,
    Invert,
    /// -100 (black) to 100 (white)
    Brightness { level: i32 },
    /// -100 to 100
    Contrast { level: f32 },
    /// Per-channel shift, each -100 to 100
    Colorize { red: i32, green: i32, blue: i32 },
}

/// Largest width or height an operation may produce
pub const MAX_EDGE: u32 = 16_384;

/// Largest pixel count an operation may produce
pub const MAX_PIXELS: u64 = 64_000_000;

/// Every verb accepted in an image profile
pub const IMAGE_VOCABULARY: &[&str] = &[
    "crop",
    "resize",
    "heighten",
    "widen",
    "fit",
    "blur",
    "sharpen",
    "rotate",
    "flip",
    "greyscale",
    "invert",
    "brightness",
    "contrast",
    "colorize",
];

impl ImageOperation {
    /// Verb under which this operation appears in profiles
    pub fn name(&self) -> &'static str {
        match self {
            ImageOperation::Crop { .. } => "crop",
            ImageOperation::Resize { .. } => "resize",
            ImageOperation::Heighten { .. } => "heighten",
            ImageOperation::Widen { .. } => "widen",
            ImageOperation::Fit { .. } => "fit",
            ImageOperation::Blur { .. } => "blur",
            ImageOperation::Sharpen { .. } => "sharpen",
            ImageOperation::Rotate { .. } => "rotate",
            ImageOperation::Flip(_) => "flip",
            ImageOperation::Greyscale => "greyscale",
            ImageOperation::Invert => "invert",
            ImageOperation::Brightness { .. } => "brightness",
            ImageOperation::Contrast { .. } => "contrast",
            ImageOperation::Colorize { .. } => "colorize",
        }
    }

    /// Parse a configured step into the vocabulary.
    pub fn parse(spec: &OperationSpec) -> DriveResult<Self> {
        let p = Params {
            operation: spec.name.as_str(),
            values: &spec.params,
        };

        let op = match spec.name.to_lowercase().as_str() {
            "crop" => {
                p.arity(2, 4)?;
                let offset = if p.values.len() == 4 {
                    Some((p.unsigned(2)?, p.unsigned(3)?))
                } else if p.values.len() == 3 {
                    return Err(p.invalid("expected both x and y offsets, or neither"));
                } else {
                    None
                };
                ImageOperation::Crop {
                    width: p.dimension(0)?,
                    height: p.dimension(1)?,
                    offset,
                }
            }
            "resize" => {
                p.arity(2, 2)?;
                let (width, height) = p.area(0, 1)?;
                ImageOperation::Resize { width, height }
            }
            "heighten" => {
                p.arity(1, 1)?;
                ImageOperation::Heighten {
                    height: p.dimension(0)?,
                }
            }
            "widen" => {
                p.arity(1, 1)?;
                ImageOperation::Widen {
                    width: p.dimension(0)?,
                }
            }
            "fit" => {
                p.arity(2, 2)?;
                let (width, height) = p.area(0, 1)?;
                ImageOperation::Fit { width, height }
            }
            "blur" => {
                p.arity(0, 1)?;
                let sigma = if p.values.is_empty() { 1.0 } else { p.number(0)? as f32 };
                if sigma < 0.0 {
                    return Err(p.invalid("blur amount must not be negative"));
                }
                ImageOperation::Blur { sigma }
            }
            "sharpen" => {
                p.arity(0, 2)?;
                let sigma = if p.values.is_empty() { 1.0 } else { p.number(0)? as f32 };
                let threshold = if p.values.len() == 2 { p.level(1, 0, 255)? } else { 0 };
                if sigma < 0.0 {
                    return Err(p.invalid("sharpen amount must not be negative"));
                }
                ImageOperation::Sharpen { sigma, threshold }
            }
            "rotate" => {
                p.arity(1, 1)?;
                ImageOperation::Rotate {
                    degrees: p.number(0)? as f32,
                }
            }
            "flip" => {
                p.arity(0, 1)?;
                let axis = match p.values.first() {
                    None => FlipAxis::Horizontal,
                    Some(Value::String(s)) if s.eq_ignore_ascii_case("h") => FlipAxis::Horizontal,
                    Some(Value::String(s)) if s.eq_ignore_ascii_case("v") => FlipAxis::Vertical,
                    Some(_) => return Err(p.invalid("axis must be \"h\" or \"v\"")),
                };
                ImageOperation::Flip(axis)
            }
            "greyscale" | "grayscale" => {
                p.arity(0, 0)?;
                ImageOperation::Greyscale
            }
            "invert" => {
                p.arity(0, 0)?;
                ImageOperation::Invert
            }
            "brightness" => {
                p.arity(1, 1)?;
                ImageOperation::Brightness {
                    level: p.level(0, -100, 100)?,
                }
            }
            "contrast" => {
                p.arity(1, 1)?;
                ImageOperation::Contrast {
                    level: p.level(0, -100, 100)? as f32,
                }
            }
            "colorize" => {
                p.arity(3, 3)?;
                ImageOperation::Colorize {
                    red: p.level(0, -100, 100)?,
                    green: p.level(1, -100, 100)?,
                    blue: p.level(2, -100, 100)?,
                }
            }
            _ => {
                return Err(DriveError::InvalidOperation {
                    operation: spec.name.clone(),
                    reason: format!("not an image operation (expected one of {IMAGE_VOCABULARY:?})"),
                })
            }
        };

        Ok(op)
    }

    /// Positional form of this operation, as it would be written in a profile.
    pub fn to_spec(&self) -> OperationSpec {
        let params: Vec<Value> = match *self {
            ImageOperation::Crop {
                width,
                height,
                offset,
            } => match offset {
                Some((x, y)) => vec![width.into(), height.into(), x.into(), y.into()],
                None => vec![width.into(), height.into()],
            },
            ImageOperation::Resize { width, height } | ImageOperation::Fit { width, height } => {
                vec![width.into(), height.into()]
            }
            ImageOperation::Heighten { height } => vec![height.into()],
            ImageOperation::Widen { width } => vec![width.into()],
            ImageOperation::Blur { sigma } => vec![f64::from(sigma).into()],
            ImageOperation::Sharpen { sigma, threshold } => {
                vec![f64::from(sigma).into(), threshold.into()]
            }
            ImageOperation::Rotate { degrees } => vec![f64::from(degrees).into()],
            ImageOperation::Flip(FlipAxis::Horizontal) => vec!["h".into()],
            ImageOperation::Flip(FlipAxis::Vertical) => vec!["v".into()],
            ImageOperation::Greyscale | ImageOperation::Invert => Vec::new(),
            ImageOperation::Brightness { level } => vec![level.into()],
            ImageOperation::Contrast { level } => vec![f64::from(level).into()],
            ImageOperation::Colorize { red, green, blue } => {
                vec![red.into(), green.into(), blue.into()]
            }
        };
        OperationSpec::new(self.name(), params)
    }
}

struct Params<'a> {
    operation: &'a str,
    values: &'a [Value],
}

impl Params<'_> {
    fn invalid(&self, reason: impl Into<String>) -> DriveError {
        DriveError::InvalidOperation {
            operation: self.operation.to_string(),
            reason: reason.into(),
        }
    }

    fn arity(&self, min: usize, max: usize) -> DriveResult<()> {
        let n = self.values.len();
        if n < min || n > max {
            let expected = if min == max {
                format!("{min}")
            } else {
                format!("{min} to {max}")
            };
            return Err(self.invalid(format!("expected {expected} parameters, got {n}")));
        }
        Ok(())
    }

    fn number(&self, index: usize) -> DriveResult<f64> {
        self.values
            .get(index)
            .and_then(Value::as_f64)
            .filter(|n| n.is_finite())
            .ok_or_else(|| self.invalid(format!("parameter {index} must be a number")))
    }

    fn unsigned(&self, index: usize) -> DriveResult<u32> {
        let n = self.number(index)?;
        if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
            return Err(self.invalid(format!(
                "parameter {index} must be a non-negative integer"
            )));
        }
        Ok(n as u32)
    }

    fn dimension(&self, index: usize) -> DriveResult<u32> {
        let n = self.unsigned(index)?;
        if n == 0 {
            return Err(self.invalid(format!("parameter {index} must be greater than zero")));
        }
        if n > MAX_EDGE {
            return Err(self.invalid(format!(
                "parameter {index} must be at most {MAX_EDGE} pixels"
            )));
        }
        Ok(n)
    }

    /// A `width`x`height` pair whose area stays under [`MAX_PIXELS`]
    fn area(&self, width: usize, height: usize) -> DriveResult<(u32, u32)> {
        let (w, h) = (self.dimension(width)?, self.dimension(height)?);
        if u64::from(w) * u64::from(h) > MAX_PIXELS {
            return Err(self.invalid(format!(
                "{w}x{h} exceeds the {MAX_PIXELS} pixel limit"
            )));
        }
        Ok((w, h))
    }

    fn level(&self, index: usize, min: i32, max: i32) -> DriveResult<i32> {
        let n = self.number(index)?;
        if n < f64::from(min) || n > f64::from(max) {
            return Err(self.invalid(format!(
                "parameter {index} must be between {min} and {max}"
            )));
        }
        Ok(n.round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(name: &str, params: Value) -> OperationSpec {
        let params = params.as_array().cloned().unwrap_or_default();
        OperationSpec::new(name, params)
    }

    #[test]
    fn test_parse_crop_with_offset() {
        let op = ImageOperation::parse(&step("crop", json!([100, 100, 25, 25]))).unwrap();
        assert_eq!(
            op,
            ImageOperation::Crop {
                width: 100,
                height: 100,
                offset: Some((25, 25))
            }
        );
    }

    #[test]
    fn test_parse_crop_centred() {
        let op = ImageOperation::parse(&step("crop", json!([10, 20]))).unwrap();
        assert_eq!(
            op,
            ImageOperation::Crop {
                width: 10,
                height: 20,
                offset: None
            }
        );
    }

    #[test]
    fn test_parse_crop_rejects_single_offset() {
        let err = ImageOperation::parse(&step("crop", json!([10, 20, 5]))).unwrap_err();
        assert!(matches!(err, DriveError::InvalidOperation { .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_verb() {
        let err = ImageOperation::parse(&step("explode", json!([]))).unwrap_err();
        match err {
            DriveError::InvalidOperation { operation, .. } => assert_eq!(operation, "explode"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_parameters() {
        assert!(ImageOperation::parse(&step("heighten", json!([0]))).is_err());
        assert!(ImageOperation::parse(&step("heighten", json!(["tall"]))).is_err());
        assert!(ImageOperation::parse(&step("resize", json!([10]))).is_err());
        assert!(ImageOperation::parse(&step("brightness", json!([150]))).is_err());
        assert!(ImageOperation::parse(&step("flip", json!(["x"]))).is_err());
        assert!(ImageOperation::parse(&step("blur", json!([-1]))).is_err());
        assert!(ImageOperation::parse(&step("crop", json!([10.5, 10]))).is_err());
    }

    #[test]
    fn test_parse_rejects_oversized_dimensions() {
        let huge = u64::from(u32::MAX);
        for (name, params) in [
            ("resize", json!([huge, huge])),
            ("fit", json!([10, MAX_EDGE + 1])),
            ("widen", json!([MAX_EDGE + 1])),
            ("heighten", json!([huge])),
            ("crop", json!([MAX_EDGE + 1, 10])),
            ("resize", json!([MAX_EDGE, MAX_EDGE])),
        ] {
            let err = ImageOperation::parse(&step(name, params)).unwrap_err();
            assert!(
                matches!(err, DriveError::InvalidOperation { ref operation, .. } if operation == name),
                "{name}: {err:?}"
            );
        }
        assert!(ImageOperation::parse(&step("widen", json!([MAX_EDGE]))).is_ok());
        assert!(ImageOperation::parse(&step("resize", json!([8000, 8000]))).is_ok());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let op = ImageOperation::parse(&step("Greyscale", json!([]))).unwrap();
        assert_eq!(op, ImageOperation::Greyscale);
        let op = ImageOperation::parse(&step("grayscale", json!([]))).unwrap();
        assert_eq!(op, ImageOperation::Greyscale);
    }

    #[test]
    fn test_flip_axes() {
        assert_eq!(
            ImageOperation::parse(&step("flip", json!(["v"]))).unwrap(),
            ImageOperation::Flip(FlipAxis::Vertical)
        );
        assert_eq!(
            ImageOperation::parse(&step("flip", json!([]))).unwrap(),
            ImageOperation::Flip(FlipAxis::Horizontal)
        );
    }

    #[test]
    fn test_to_spec_parses_back() {
        let ops = [
            ImageOperation::Crop {
                width: 100,
                height: 50,
                offset: Some((3, 4)),
            },
            ImageOperation::Rotate { degrees: 90.0 },
            ImageOperation::Flip(FlipAxis::Vertical),
            ImageOperation::Colorize {
                red: 10,
                green: -20,
                blue: 0,
            },
        ];
        for op in ops {
            assert_eq!(ImageOperation::parse(&op.to_spec()).unwrap(), op);
        }
    }
}
