//! Contrast and brightness as a linear tone transform.
//!
//! Every channel value goes through
//!
//! ```text
//! out = saturate(round(in * (contrast + 1) + bias))
//! ```
//!
//! where `bias` is the brightness scaled to 256 levels and truncated toward
//! zero. The transform is evaluated once per input level into a lookup table
//! and then applied to every byte.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ensure_finite, ScanTask};
use crate::buffer::ScanImage;
use crate::error::{invalid_param, Result, ScanError};
use crate::options::ScanOptions;
use crate::record;

/// Linear contrast/brightness adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    contrast: f64,
    bias: i32,
}

#[derive(Serialize, Deserialize)]
struct Fields {
    contrast: f64,
    brightness: f64,
}

impl Adjustment {
    /// # Errors
    ///
    /// `InvalidParameter` unless both values lie in [-1, 1].
    pub fn new(contrast: f64, brightness: f64) -> Result<Self> {
        ensure_finite("contrast", contrast)?;
        ensure_finite("brightness", brightness)?;
        if !(-1.0..=1.0).contains(&contrast) || !(-1.0..=1.0).contains(&brightness) {
            return Err(invalid_param!(
                "contrast {contrast} and brightness {brightness} must lie in [-1, 1]"
            ));
        }
        Ok(Self {
            contrast,
            bias: (brightness * 256.0) as i32,
        })
    }

    /// User-facing contrast in [-1, 1].
    pub fn contrast(&self) -> f64 {
        self.contrast
    }

    /// User-facing brightness in [-1, 1], quantized to 1/256 steps.
    pub fn brightness(&self) -> f64 {
        self.bias as f64 / 256.0
    }

    /// Multiplier applied to every channel value.
    pub fn gain(&self) -> f64 {
        self.contrast + 1.0
    }

    /// Offset added after the multiplier, in channel levels.
    pub fn bias(&self) -> i32 {
        self.bias
    }

    /// Evaluate the transform for every 8-bit level.
    pub fn lookup_table(&self) -> [u8; 256] {
        let gain = self.gain();
        let bias = self.bias as f64;
        let mut lut = [0u8; 256];
        for (level, value) in lut.iter_mut().enumerate() {
            *value = (level as f64 * gain + bias).round().clamp(0.0, 255.0) as u8;
        }
        lut
    }
}

impl ScanTask for Adjustment {
    const TYPE_NAME: &'static str = "AdjustmentScanTask";

    fn is_identity(&self) -> bool {
        self.contrast == 0.0 && self.bias == 0
    }

    fn render(&self, mut image: ScanImage, _options: &ScanOptions) -> Result<ScanImage> {
        if !image.is_valid() {
            return Err(ScanError::ExecutionFailure(format!(
                "{}: {} bytes do not describe a {}x{} RGB image",
                Self::TYPE_NAME,
                image.pixels.len(),
                image.width,
                image.height
            )));
        }
        let lut = self.lookup_table();
        for byte in image.pixels.iter_mut() {
            *byte = lut[*byte as usize];
        }
        Ok(image)
    }

    fn to_record(&self) -> Value {
        let fields = Fields {
            contrast: self.contrast(),
            brightness: self.brightness(),
        };
        record::tagged(Self::TYPE_NAME, &fields)
    }

    fn from_record(value: &Value) -> Result<Self> {
        let f: Fields = record::untagged(Self::TYPE_NAME, value)?;
        Self::new(f.contrast, f.brightness)
    }
}
