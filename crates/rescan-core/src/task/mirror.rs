//! Mirror flips about the vertical and horizontal axes.

use image::imageops;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{into_rgb, ScanTask};
use crate::buffer::ScanImage;
use crate::error::Result;
use crate::options::ScanOptions;
use crate::record;

/// Flip the image left/right (`flip_x`), top/bottom (`flip_y`), or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mirror {
    #[serde(rename = "x")]
    flip_x: bool,
    #[serde(rename = "y")]
    flip_y: bool,
}

impl Mirror {
    /// Any combination of flags is valid.
    pub fn new(flip_x: bool, flip_y: bool) -> Self {
        Self { flip_x, flip_y }
    }

    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    pub fn flip_y(&self) -> bool {
        self.flip_y
    }
}

impl ScanTask for Mirror {
    const TYPE_NAME: &'static str = "MirrorScanTask";

    fn is_identity(&self) -> bool {
        !self.flip_x && !self.flip_y
    }

    fn render(&self, image: ScanImage, _options: &ScanOptions) -> Result<ScanImage> {
        let mut rgb = into_rgb(image, Self::TYPE_NAME)?;
        match (self.flip_x, self.flip_y) {
            (true, true) => imageops::rotate180_in_place(&mut rgb),
            (true, false) => imageops::flip_horizontal_in_place(&mut rgb),
            (false, true) => imageops::flip_vertical_in_place(&mut rgb),
            (false, false) => {}
        }
        Ok(ScanImage::from_rgb_image(rgb))
    }

    fn to_record(&self) -> Value {
        record::tagged(Self::TYPE_NAME, self)
    }

    fn from_record(value: &Value) -> Result<Self> {
        record::untagged(Self::TYPE_NAME, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::test_support::gradient_image;
    use crate::ScanError;
    use serde_json::json;

    #[test]
    fn test_flip_x_mirrors_columns() {
        let img = gradient_image(5, 3);
        let result = Mirror::new(true, false).run(img).unwrap();

        assert_eq!((result.width, result.height), (5, 3));
        assert_eq!(result.pixel(0, 0), Some([4, 0, 4]));
        assert_eq!(result.pixel(4, 2), Some([0, 2, 2]));
    }

    #[test]
    fn test_flip_y_mirrors_rows() {
        let img = gradient_image(5, 3);
        let result = Mirror::new(false, true).run(img).unwrap();

        assert_eq!(result.pixel(0, 0), Some([0, 2, 2]));
        assert_eq!(result.pixel(3, 2), Some([3, 0, 3]));
    }

    #[test]
    fn test_both_flips_rotate_half_turn() {
        let img = gradient_image(4, 6);
        let result = Mirror::new(true, true).run(img).unwrap();

        assert_eq!((result.width, result.height), (4, 6));
        assert_eq!(result.pixel(0, 0), Some([3, 5, 8]));
        assert_eq!(result.pixel(3, 5), Some([0, 0, 0]));
    }

    #[test]
    fn test_double_flip_restores_image() {
        let img = gradient_image(7, 4);
        let mirror = Mirror::new(true, false);
        let once = mirror.run(img.clone()).unwrap();
        let twice = mirror.run(once).unwrap();
        assert_eq!(twice, img);
    }

    #[test]
    fn test_record_shape() {
        let mirror = Mirror::new(true, false);
        let record = mirror.to_record();
        assert_eq!(record, json!({"type": "MirrorScanTask", "x": true, "y": false}));
        assert_eq!(Mirror::from_record(&record).unwrap(), mirror);
    }

    #[test]
    fn test_record_requires_booleans() {
        let record = json!({"type": "MirrorScanTask", "x": 1, "y": false});
        assert!(matches!(
            Mirror::from_record(&record),
            Err(ScanError::MalformedRecord(_))
        ));
    }
}
