//! Scaling by independent horizontal and vertical factors.

use image::imageops;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ensure_finite, into_rgb, ScanTask};
use crate::buffer::ScanImage;
use crate::error::{invalid_param, Result, ScanError};
use crate::options::ScanOptions;
use crate::record;

/// Largest output a zoom may produce, in pixels (16384 x 16384).
pub const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

/// Resize the image by `scale_x` horizontally and `scale_y` vertically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Zoom {
    #[serde(rename = "x")]
    scale_x: f64,
    #[serde(rename = "y")]
    scale_y: f64,
}

#[derive(Deserialize)]
struct Fields {
    x: f64,
    y: f64,
}

impl Zoom {
    /// # Errors
    ///
    /// `InvalidParameter` unless both factors are finite and positive.
    pub fn new(scale_x: f64, scale_y: f64) -> Result<Self> {
        ensure_finite("zoom x", scale_x)?;
        ensure_finite("zoom y", scale_y)?;
        if scale_x <= 0.0 || scale_y <= 0.0 {
            return Err(invalid_param!(
                "zoom factors must be positive, got {scale_x}x{scale_y}"
            ));
        }
        Ok(Self { scale_x, scale_y })
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Output dimensions for an input of the given size.
    ///
    /// Returns `None` when either dimension rounds to zero, or the output
    /// would exceed [`MAX_OUTPUT_PIXELS`].
    pub fn target_dimensions(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let w = (width as f64 * self.scale_x).round();
        let h = (height as f64 * self.scale_y).round();
        let fits = |v: f64| v >= 1.0 && v <= u32::MAX as f64;
        if !fits(w) || !fits(h) {
            return None;
        }
        let (w, h) = (w as u32, h as u32);
        (w as u64 * h as u64 <= MAX_OUTPUT_PIXELS).then_some((w, h))
    }
}

impl ScanTask for Zoom {
    const TYPE_NAME: &'static str = "ZoomScanTask";

    fn is_identity(&self) -> bool {
        self.scale_x == 1.0 && self.scale_y == 1.0
    }

    fn render(&self, image: ScanImage, options: &ScanOptions) -> Result<ScanImage> {
        let (width, height) = self
            .target_dimensions(image.width, image.height)
            .ok_or_else(|| {
                ScanError::ExecutionFailure(format!(
                    "zoom {}x{} of a {}x{} image has no valid size",
                    self.scale_x, self.scale_y, image.width, image.height
                ))
            })?;

        // Fast path: rounding may land back on the input size
        if width == image.width && height == image.height {
            return Ok(image);
        }

        let rgb = into_rgb(image, Self::TYPE_NAME)?;
        let resized = imageops::resize(&rgb, width, height, options.filter.to_image_filter());
        Ok(ScanImage::from_rgb_image(resized))
    }

    fn to_record(&self) -> Value {
        record::tagged(Self::TYPE_NAME, self)
    }

    fn from_record(value: &Value) -> Result<Self> {
        let f: Fields = record::untagged(Self::TYPE_NAME, value)?;
        Self::new(f.x, f.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FilterType;
    use crate::task::test_support::gradient_image;
    use crate::task::Task;
    use serde_json::json;

    #[test]
    fn test_downscale() {
        let img = gradient_image(100, 50);
        let result = Zoom::new(0.5, 0.5).unwrap().run(img).unwrap();
        assert_eq!((result.width, result.height), (50, 25));
        assert!(result.is_valid());
    }

    #[test]
    fn test_anisotropic_upscale() {
        let img = gradient_image(10, 10);
        let result = Zoom::new(2.0, 1.5).unwrap().run(img).unwrap();
        assert_eq!((result.width, result.height), (20, 15));
    }

    #[test]
    fn test_nearest_filter_keeps_values() {
        let img = ScanImage::filled(4, 4, [200, 100, 50]);
        let options = ScanOptions::new().with_filter(FilterType::Nearest);
        let result = Zoom::new(3.0, 3.0).unwrap().apply(img, &options).unwrap();
        assert_eq!((result.width, result.height), (12, 12));
        assert!(result.pixels.chunks(3).all(|p| p == [200, 100, 50]));
    }

    #[test]
    fn test_rounding_to_zero_fails() {
        let img = gradient_image(10, 10);
        let result = Zoom::new(0.01, 1.0).unwrap().run(img);
        assert!(matches!(result, Err(ScanError::ExecutionFailure(_))));
    }

    #[test]
    fn test_oversized_output_fails() {
        let zoom = Zoom::new(1e5, 1e5).unwrap();
        assert_eq!(zoom.target_dimensions(1000, 1000), None);

        let result = zoom.run(gradient_image(1000, 1000));
        assert!(matches!(result, Err(ScanError::ExecutionFailure(_))));
    }

    #[test]
    fn test_output_pixel_cap_boundary() {
        let zoom = Zoom::new(16384.0, 16384.0).unwrap();
        assert_eq!(zoom.target_dimensions(1, 1), Some((16384, 16384)));
        let zoom = Zoom::new(16385.0, 16384.0).unwrap();
        assert_eq!(zoom.target_dimensions(1, 1), None);
    }

    #[test]
    fn test_json_text_round_trip_is_exact() {
        let zoom = Zoom::new(0.09139753876361889, 3.3).unwrap();
        let task: Task = zoom.into();
        assert_eq!(Task::from_json(&task.to_json()).unwrap(), task);
    }

    #[test]
    fn test_rounding_back_to_input_size() {
        let img = gradient_image(10, 10);
        let ptr = img.pixels.as_ptr();
        let result = Zoom::new(1.01, 1.0).unwrap().run(img).unwrap();
        assert_eq!((result.width, result.height), (10, 10));
        assert_eq!(result.pixels.as_ptr(), ptr);
    }

    #[test]
    fn test_boundaries() {
        assert!(Zoom::new(f64::MIN_POSITIVE, f64::MIN_POSITIVE).is_ok());
        assert!(Zoom::new(1.0, 1.0).unwrap().is_identity());
        assert!(!Zoom::new(1.0, 2.0).unwrap().is_identity());
    }

    #[test]
    fn test_invalid_parameters() {
        for (x, y) in [(0.0, 1.0), (1.0, 0.0), (-1.0, 1.0), (f64::NAN, 1.0), (1.0, f64::INFINITY)] {
            assert!(
                matches!(Zoom::new(x, y), Err(ScanError::InvalidParameter(_))),
                "({x}, {y}) should be rejected"
            );
        }
    }

    #[test]
    fn test_record_shape() {
        let zoom = Zoom::new(0.5, 2.0).unwrap();
        let record = zoom.to_record();
        assert_eq!(record, json!({"type": "ZoomScanTask", "x": 0.5, "y": 2.0}));
        assert_eq!(Zoom::from_record(&record).unwrap(), zoom);
    }

    #[test]
    fn test_record_validation() {
        let record = json!({"type": "ZoomScanTask", "x": -2.0, "y": 1.0});
        assert!(matches!(
            Zoom::from_record(&record),
            Err(ScanError::InvalidParameter(_))
        ));
    }
}
