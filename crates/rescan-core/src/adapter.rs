//! Conversion between host image types and [`ScanImage`].
//!
//! A pipeline run decodes the host image once, folds every task over the
//! internal buffer, and encodes the result back into the same host type.

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

use crate::buffer::ScanImage;
use crate::error::{Result, ScanError};

/// A host image type the pipeline can run on.
pub trait ScanSource: Sized {
    /// Decode into the internal RGB buffer.
    fn into_scan_image(self) -> Result<ScanImage>;

    /// Encode the internal buffer back into the host type.
    fn from_scan_image(image: ScanImage) -> Result<Self>;
}

impl ScanSource for ScanImage {
    fn into_scan_image(self) -> Result<ScanImage> {
        Ok(self)
    }

    fn from_scan_image(image: ScanImage) -> Result<Self> {
        Ok(image)
    }
}

impl ScanSource for RgbImage {
    fn into_scan_image(self) -> Result<ScanImage> {
        Ok(ScanImage::from_rgb_image(self))
    }

    fn from_scan_image(image: ScanImage) -> Result<Self> {
        let (width, height) = (image.width, image.height);
        image.into_rgb_image().ok_or_else(|| {
            ScanError::UnsupportedBufferKind(format!(
                "buffer does not describe a {width}x{height} RGB image"
            ))
        })
    }
}

/// Alpha is dropped on the way in and written back fully opaque.
impl ScanSource for RgbaImage {
    fn into_scan_image(self) -> Result<ScanImage> {
        let (width, height) = self.dimensions();
        let rgb = RgbImage::from_fn(width, height, |x, y| {
            let Rgba([r, g, b, _]) = *self.get_pixel(x, y);
            Rgb([r, g, b])
        });
        Ok(ScanImage::from_rgb_image(rgb))
    }

    fn from_scan_image(image: ScanImage) -> Result<Self> {
        let rgb = RgbImage::from_scan_image(image)?;
        let (width, height) = rgb.dimensions();
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let Rgb([r, g, b]) = *rgb.get_pixel(x, y);
            Rgba([r, g, b, 255])
        }))
    }
}

/// Accepts 8-bit RGB and RGBA; always encodes as 8-bit RGB.
impl ScanSource for DynamicImage {
    fn into_scan_image(self) -> Result<ScanImage> {
        match self {
            DynamicImage::ImageRgb8(rgb) => rgb.into_scan_image(),
            DynamicImage::ImageRgba8(rgba) => rgba.into_scan_image(),
            other => Err(ScanError::UnsupportedBufferKind(format!(
                "{:?} images are not supported",
                other.color()
            ))),
        }
    }

    fn from_scan_image(image: ScanImage) -> Result<Self> {
        RgbImage::from_scan_image(image).map(DynamicImage::ImageRgb8)
    }
}
