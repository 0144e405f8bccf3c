//! Relative (fractional) and absolute (pixel) coordinates.
//!
//! Relative coordinates are resolution independent: (0.0, 0.0) is the
//! top-left corner and (1.0, 1.0) the bottom-right corner of whatever buffer
//! the task eventually runs on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::record;

/// Position expressed as a fraction of image width and height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativePoint {
    pub x: f64,
    pub y: f64,
}

impl RelativePoint {
    /// Discriminator used in serialized records.
    pub const TYPE_NAME: &'static str = "RelativePoint";

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert a pixel position back into fractions of `width` x `height`.
    pub fn from_absolute(point: AbsolutePoint, width: u32, height: u32) -> Self {
        Self {
            x: point.x as f64 / width as f64,
            y: point.y as f64 / height as f64,
        }
    }

    /// True when both axes lie in [0, 1].
    pub fn in_unit_square(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }

    pub fn to_record(&self) -> Value {
        record::tagged(Self::TYPE_NAME, self)
    }

    pub fn from_record(value: &Value) -> Result<Self> {
        record::untagged(Self::TYPE_NAME, value)
    }
}

/// Integer pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbsolutePoint {
    pub x: i64,
    pub y: i64,
}

impl AbsolutePoint {
    /// Discriminator used in serialized records.
    pub const TYPE_NAME: &'static str = "AbsolutePoint";

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Scale a relative point by the image dimensions, rounding to the
    /// nearest pixel.
    pub fn from_relative(point: RelativePoint, width: u32, height: u32) -> Self {
        Self {
            x: (point.x * width as f64).round() as i64,
            y: (point.y * height as f64).round() as i64,
        }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Exact for any pair of pixel coordinates that fit an image.
    pub fn distance_squared(&self, other: &AbsolutePoint) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx * dx + dy * dy
    }

    pub fn to_record(&self) -> Value {
        record::tagged(Self::TYPE_NAME, self)
    }

    pub fn from_record(value: &Value) -> Result<Self> {
        record::untagged(Self::TYPE_NAME, value)
    }
}

impl From<AbsolutePoint> for (f32, f32) {
    fn from(point: AbsolutePoint) -> Self {
        (point.x as f32, point.y as f32)
    }
}
