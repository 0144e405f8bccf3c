//! Rotation about the image center with an expanded canvas.
//!
//! Quarter turns are exact pixel permutations. Any other angle is an affine
//! warp: the output canvas is the bounding box of the rotated image, the
//! source center lands on the output center, and pixels with no source take
//! the configured background.
//!
//! For a clockwise rotation by θ the forward transform is:
//! ```text
//! dst = T(dst_center) · R(θ) · T(-src_center) · src
//! ```
//! and the warp samples the source through its inverse.

use image::{imageops, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Projection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{into_rgb, ScanTask};
use crate::buffer::ScanImage;
use crate::error::{Result, ScanError};
use crate::options::ScanOptions;
use crate::record;

/// Rotate by a whole number of degrees, positive = clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rotation {
    angle: i32,
}

#[derive(Deserialize)]
struct Fields {
    angle: i32,
}

impl Rotation {
    /// Every angle is valid; multiples of 360 are a no-op.
    pub fn new(angle: i32) -> Self {
        Self { angle }
    }

    pub fn angle(&self) -> i32 {
        self.angle
    }

    /// Angle folded into [0, 360).
    pub fn normalized_angle(&self) -> i32 {
        self.angle.rem_euclid(360)
    }
}

/// Compute the dimensions of the canvas holding a rotated image.
///
/// Uses `|w·cos θ| + |h·sin θ|` by `|w·sin θ| + |h·cos θ|`, truncated, with
/// a floor of one pixel. Quarter turns are exact.
///
/// # Example
///
/// ```ignore
/// use rescan_core::task::compute_rotated_bounds;
///
/// // 90-degree rotation swaps dimensions
/// assert_eq!(compute_rotated_bounds(100, 50, 90), (50, 100));
/// // No rotation preserves dimensions
/// assert_eq!(compute_rotated_bounds(100, 50, 0), (100, 50));
/// ```
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: i32) -> (u32, u32) {
    match angle_degrees.rem_euclid(360) {
        0 | 180 => return (width, height),
        90 | 270 => return (height, width),
        _ => {}
    }

    let angle_rad = (angle_degrees as f64).to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    let new_w = (w * cos + h * sin) as u32;
    let new_h = (w * sin + h * cos) as u32;

    (new_w.max(1), new_h.max(1))
}

impl ScanTask for Rotation {
    const TYPE_NAME: &'static str = "RotatingScanTask";

    fn is_identity(&self) -> bool {
        self.normalized_angle() == 0
    }

    fn render(&self, image: ScanImage, options: &ScanOptions) -> Result<ScanImage> {
        let rgb = into_rgb(image, Self::TYPE_NAME)?;

        let rotated = match self.normalized_angle() {
            90 => imageops::rotate90(&rgb),
            180 => {
                let mut rgb = rgb;
                imageops::rotate180_in_place(&mut rgb);
                rgb
            }
            270 => imageops::rotate270(&rgb),
            _ => rotate_with_canvas(&rgb, self.angle, options)?,
        };

        Ok(ScanImage::from_rgb_image(rotated))
    }

    fn to_record(&self) -> Value {
        record::tagged(Self::TYPE_NAME, self)
    }

    fn from_record(value: &Value) -> Result<Self> {
        record::expect_type(Self::TYPE_NAME, value)?;
        // The pivot form carries a rotation center; its geometry differs and
        // is not accepted under this name.
        if value.get("x").is_some() || value.get("y").is_some() {
            return Err(ScanError::MalformedRecord(format!(
                "{}: rotation about an explicit center is not supported",
                Self::TYPE_NAME
            )));
        }
        let f: Fields = record::untagged(Self::TYPE_NAME, value)?;
        Ok(Self::new(f.angle))
    }
}

fn rotate_with_canvas(src: &RgbImage, angle: i32, options: &ScanOptions) -> Result<RgbImage> {
    let (src_w, src_h) = src.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(ScanError::ExecutionFailure(format!(
            "cannot rotate a {src_w}x{src_h} image"
        )));
    }
    let (dst_w, dst_h) = compute_rotated_bounds(src_w, src_h, angle);

    let theta = (angle as f32).to_radians();
    let projection = Projection::translate(dst_w as f32 / 2.0, dst_h as f32 / 2.0)
        * Projection::rotate(theta)
        * Projection::translate(-(src_w as f32) / 2.0, -(src_h as f32) / 2.0);

    let background = Rgb(options.background);
    let mut output = RgbImage::from_pixel(dst_w, dst_h, background);
    warp_into(
        src,
        &projection,
        options.filter.to_warp_interpolation(),
        background,
        &mut output,
    );
    Ok(output)
}
