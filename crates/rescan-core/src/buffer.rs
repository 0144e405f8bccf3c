//! The internal pixel buffer every task reads and writes.

use image::RgbImage;

/// An RGB image owned by a single pipeline run.
///
/// Pixels are stored row-major with 3 bytes per pixel. Tasks take the buffer
/// by value; a task whose parameters are a no-op hands the same buffer back
/// untouched, so callers must not assume a fresh allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    /// Length should be width * height * 3.
    pub pixels: Vec<u8>,
}

impl ScanImage {
    /// Create a new ScanImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            Self::byte_len(width, height),
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a buffer filled with a single color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take(Self::byte_len(width, height))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap an `image::RgbImage` without copying its pixels.
    pub fn from_rgb_image(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Hand the pixels to the `image` crate without copying.
    ///
    /// Returns `None` when the pixel length does not match the dimensions.
    pub fn into_rgb_image(self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels)
    }

    /// Pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels
            .get(idx..idx + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Check if the pixel data length matches the dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == Self::byte_len(self.width, self.height)
    }

    fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled() {
        let img = ScanImage::filled(4, 2, [10, 20, 30]);
        assert_eq!(img.pixels.len(), 24);
        assert_eq!(img.pixel(3, 1), Some([10, 20, 30]));
        assert!(img.is_valid());
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let img = ScanImage::filled(2, 2, [0, 0, 0]);
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.pixel(0, 2), None);
    }

    #[test]
    fn test_rgb_image_round_trip_keeps_allocation() {
        let img = ScanImage::filled(8, 8, [1, 2, 3]);
        let ptr = img.pixels.as_ptr();
        let rgb = img.into_rgb_image().unwrap();
        let back = ScanImage::from_rgb_image(rgb);
        assert_eq!(back.pixels.as_ptr(), ptr);
        assert_eq!((back.width, back.height), (8, 8));
    }

    #[test]
    fn test_into_rgb_image_rejects_bad_length() {
        let img = ScanImage {
            width: 4,
            height: 4,
            pixels: vec![0; 10],
        };
        assert!(!img.is_valid());
        assert!(img.into_rgb_image().is_none());
    }
}
