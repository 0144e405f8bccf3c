//! Perspective correction of a photographed page.
//!
//! The caller marks the four page corners in relative coordinates. The task
//! picks an output rectangle from the corner geometry and warps the
//! quadrilateral onto it.
//!
//! # Output Size
//!
//! With the corners converted to pixels:
//!
//! 1. `diagonal` is the longer of the two diagonals
//! 2. Candidate A: height = longer vertical side, width = √(diagonal² − height²)
//! 3. Candidate B: width = longer horizontal side, height = √(diagonal² − width²)
//! 4. The candidate with the larger area wins (B on ties)
//!
//! This keeps near-rectangular pages at their natural size while absorbing
//! mild keystone distortion. It is an estimate, not a planar rectification.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Projection};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{into_rgb, ScanTask};
use crate::buffer::ScanImage;
use crate::error::{invalid_param, Result, ScanError};
use crate::options::ScanOptions;
use crate::point::{AbsolutePoint, RelativePoint};
use crate::record;

const UNIT_SQUARE: [RelativePoint; 4] = [
    RelativePoint::new(0.0, 0.0),
    RelativePoint::new(1.0, 0.0),
    RelativePoint::new(1.0, 1.0),
    RelativePoint::new(0.0, 1.0),
];

const CORNER_NAMES: [&str; 4] = ["top-left", "top-right", "bottom-right", "bottom-left"];

/// Warp a quadrilateral, given as top-left, top-right, bottom-right and
/// bottom-left corners, onto an upright rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCorrection {
    corners: [RelativePoint; 4],
}

#[derive(Serialize)]
struct Fields {
    points: Vec<Value>,
}

impl PerspectiveCorrection {
    /// # Errors
    ///
    /// `InvalidParameter` if a corner lies outside the unit square or the
    /// corners are not in clockwise order starting at the top-left:
    /// top-left is left of top-right, top-right is above bottom-right,
    /// bottom-right is right of bottom-left, bottom-left is below top-left.
    pub fn new(
        top_left: RelativePoint,
        top_right: RelativePoint,
        bottom_right: RelativePoint,
        bottom_left: RelativePoint,
    ) -> Result<Self> {
        let corners = [top_left, top_right, bottom_right, bottom_left];
        for (corner, name) in corners.iter().zip(CORNER_NAMES) {
            if !corner.in_unit_square() {
                return Err(invalid_param!(
                    "{name} corner ({}, {}) must lie in [0, 1]",
                    corner.x,
                    corner.y
                ));
            }
        }

        if top_left.x >= top_right.x {
            return Err(invalid_param!("top-left corner must be left of top-right"));
        }
        if top_right.y >= bottom_right.y {
            return Err(invalid_param!("top-right corner must be above bottom-right"));
        }
        if bottom_right.x <= bottom_left.x {
            return Err(invalid_param!("bottom-right corner must be right of bottom-left"));
        }
        if bottom_left.y <= top_left.y {
            return Err(invalid_param!("bottom-left corner must be below top-left"));
        }

        Ok(Self { corners })
    }

    /// Build from an array in top-left, top-right, bottom-right, bottom-left
    /// order.
    pub fn from_corners(corners: [RelativePoint; 4]) -> Result<Self> {
        let [tl, tr, br, bl] = corners;
        Self::new(tl, tr, br, bl)
    }

    /// Corners in top-left, top-right, bottom-right, bottom-left order.
    pub fn corners(&self) -> [RelativePoint; 4] {
        self.corners
    }

    /// Corners in pixels for a buffer of the given size.
    pub fn absolute_corners(&self, width: u32, height: u32) -> [AbsolutePoint; 4] {
        self.corners
            .map(|corner| AbsolutePoint::from_relative(corner, width, height))
    }

    /// Size of the rectangle the quadrilateral is warped onto.
    pub fn output_size(&self, width: u32, height: u32) -> (f64, f64) {
        fit_rectangle(&self.absolute_corners(width, height))
    }
}

/// Choose the output rectangle for pixel corners in TL, TR, BR, BL order.
///
/// Works on squared lengths so that integer corner coordinates give exact
/// results for axis-aligned rectangles.
fn fit_rectangle(corners: &[AbsolutePoint; 4]) -> (f64, f64) {
    let [tl, tr, br, bl] = corners;
    let dist_sq = AbsolutePoint::distance_squared;

    let diagonal_sq = dist_sq(tl, br).max(dist_sq(tr, bl));

    let height1_sq = dist_sq(tl, bl).max(dist_sq(tr, br));
    let width1 = (diagonal_sq - height1_sq).max(0.0).sqrt();
    let height1 = height1_sq.sqrt();

    let width2_sq = dist_sq(tl, tr).max(dist_sq(bl, br));
    let width2 = width2_sq.sqrt();
    let height2 = (diagonal_sq - width2_sq).max(0.0).sqrt();

    if width1 * height1 > width2 * height2 {
        (width1, height1)
    } else {
        (width2, height2)
    }
}

impl ScanTask for PerspectiveCorrection {
    const TYPE_NAME: &'static str = "CorrectionScanTask";

    fn is_identity(&self) -> bool {
        self.corners == UNIT_SQUARE
    }

    fn render(&self, image: ScanImage, options: &ScanOptions) -> Result<ScanImage> {
        let (src_w, src_h) = (image.width, image.height);
        let corners = self.absolute_corners(src_w, src_h);
        let (width, height) = self.output_size(src_w, src_h);
        let (out_w, out_h) = (width as u32, height as u32);

        debug!(
            top_left = ?corners[0],
            top_right = ?corners[1],
            bottom_right = ?corners[2],
            bottom_left = ?corners[3],
            width,
            height,
            "Perspective target computed"
        );

        if out_w == 0 || out_h == 0 {
            return Err(ScanError::ExecutionFailure(format!(
                "perspective target {width:.1}x{height:.1} is empty for a {src_w}x{src_h} image"
            )));
        }

        let src = corners.map(<(f32, f32)>::from);
        let (w, h) = (width as f32, height as f32);
        let dst = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
        let projection = Projection::from_control_points(src, dst).ok_or_else(|| {
            ScanError::ExecutionFailure(format!(
                "corners {corners:?} do not define a perspective transform"
            ))
        })?;

        let rgb = into_rgb(image, Self::TYPE_NAME)?;
        let background = Rgb(options.background);
        let mut output = RgbImage::from_pixel(out_w, out_h, background);
        warp_into(
            &rgb,
            &projection,
            options.filter.to_warp_interpolation(),
            background,
            &mut output,
        );

        Ok(ScanImage::from_rgb_image(output))
    }

    fn to_record(&self) -> Value {
        let fields = Fields {
            points: self.corners.iter().map(RelativePoint::to_record).collect(),
        };
        record::tagged(Self::TYPE_NAME, &fields)
    }

    fn from_record(value: &Value) -> Result<Self> {
        record::expect_type(Self::TYPE_NAME, value)?;
        let points = value
            .get("points")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ScanError::MalformedRecord(format!("{}: missing `points` array", Self::TYPE_NAME))
            })?;
        if points.len() != 4 {
            return Err(ScanError::MalformedRecord(format!(
                "{}: expected 4 points, found {}",
                Self::TYPE_NAME,
                points.len()
            )));
        }

        let mut corners = [RelativePoint::default(); 4];
        for (corner, point) in corners.iter_mut().zip(points) {
            *corner = RelativePoint::from_record(point)?;
        }
        Self::from_corners(corners)
    }
}
