//! Cropping with normalized coordinates.
//!
//! All crop parameters are in the range 0.0 to 1.0, making them independent
//! of the actual image dimensions.
//!
//! # Coordinate System
//!
//! - (0.0, 0.0) = top-left corner
//! - (1.0, 1.0) = bottom-right corner
//! - width/height are relative to the buffer dimensions

use image::imageops;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ensure_finite, into_rgb, ScanTask};
use crate::buffer::ScanImage;
use crate::error::{invalid_param, Result, ScanError};
use crate::options::ScanOptions;
use crate::record;

/// Extract a sub-rectangle of the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cropping {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
struct Fields {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Cropping {
    /// Build a crop region.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` unless `x`, `y` are in [0, 1], `width`, `height` are
    /// in (0, 1], and the region stays inside the image
    /// (`x + width <= 1`, `y + height <= 1`).
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        for (name, value) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            ensure_finite(name, value)?;
        }
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return Err(invalid_param!(
                "crop origin ({x}, {y}) must lie in [0, 1]"
            ));
        }
        if width <= 0.0 || width > 1.0 || height <= 0.0 || height > 1.0 {
            return Err(invalid_param!(
                "crop size {width}x{height} must lie in (0, 1]"
            ));
        }
        if x + width > 1.0 || y + height > 1.0 {
            return Err(invalid_param!(
                "crop region ({x}, {y}, {width}, {height}) extends past the image"
            ));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Pixel rectangle `(left, top, width, height)` for a buffer of the given
    /// size, clamped so it never leaves the buffer.
    pub fn pixel_rect(&self, image_width: u32, image_height: u32) -> (u32, u32, u32, u32) {
        let src_w = image_width as f64;
        let src_h = image_height as f64;

        let left = ((self.x * src_w).round() as u32).min(image_width);
        let top = ((self.y * src_h).round() as u32).min(image_height);
        let width = ((self.width * src_w).round() as u32).min(image_width - left);
        let height = ((self.height * src_h).round() as u32).min(image_height - top);

        (left, top, width, height)
    }
}

impl ScanTask for Cropping {
    const TYPE_NAME: &'static str = "CroppingScanTask";

    fn is_identity(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.width == 1.0 && self.height == 1.0
    }

    fn render(&self, image: ScanImage, _options: &ScanOptions) -> Result<ScanImage> {
        let (left, top, width, height) = self.pixel_rect(image.width, image.height);
        if width == 0 || height == 0 {
            return Err(ScanError::ExecutionFailure(format!(
                "crop of a {}x{} image is empty",
                image.width, image.height
            )));
        }

        let rgb = into_rgb(image, Self::TYPE_NAME)?;
        let cropped = imageops::crop_imm(&rgb, left, top, width, height).to_image();
        Ok(ScanImage::from_rgb_image(cropped))
    }

    fn to_record(&self) -> Value {
        record::tagged(Self::TYPE_NAME, self)
    }

    fn from_record(value: &Value) -> Result<Self> {
        let f: Fields = record::untagged(Self::TYPE_NAME, value)?;
        Self::new(f.x, f.y, f.width, f.height)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
