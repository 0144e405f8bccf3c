//! WASM-compatible image type.
//!
//! Browsers hand pixels around as RGBA (`ImageData`, canvas readback), so
//! `JsScanImage` stores RGBA and converts to the pipeline's RGB buffer at the
//! start and end of a run.

use rescan_core::{FilterType, Result, ScanError, ScanImage, ScanSource};
use wasm_bindgen::prelude::*;

const RGBA_CHANNELS: usize = 4;

/// An RGBA image for JavaScript.
///
/// # Memory Management
///
/// The pixel data lives in WASM memory. Calling `pixels()` copies it out to a
/// `Uint8Array`; keep the image in WASM memory between pipeline runs when
/// possible.
#[wasm_bindgen]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsScanImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsScanImage {
    /// Create an image from dimensions and RGBA pixel data (4 bytes per
    /// pixel, row-major order).
    ///
    /// The length is not checked here; running a pipeline on an image whose
    /// length does not match its dimensions fails.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsScanImage {
        JsScanImage {
            width,
            height,
            pixels,
        }
    }

    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsScanImage {
    fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * RGBA_CHANNELS
    }
}

impl ScanSource for JsScanImage {
    fn into_scan_image(self) -> Result<ScanImage> {
        let expected = self.expected_len();
        if self.pixels.len() != expected {
            return Err(ScanError::UnsupportedBufferKind(format!(
                "{}x{} RGBA image needs {expected} bytes, got {}",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }

        let rgb = self
            .pixels
            .chunks_exact(RGBA_CHANNELS)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        Ok(ScanImage::new(self.width, self.height, rgb))
    }

    fn from_scan_image(image: ScanImage) -> Result<Self> {
        if !image.is_valid() {
            return Err(ScanError::UnsupportedBufferKind(format!(
                "{} bytes do not describe a {}x{} RGB image",
                image.pixels.len(),
                image.width,
                image.height
            )));
        }

        let rgba = image
            .pixels
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect();
        Ok(JsScanImage::new(image.width, image.height, rgba))
    }
}

/// Convert a u8 filter type value to the core FilterType enum.
///
/// Values:
/// - 0 = Nearest (fastest, lowest quality)
/// - 1 = Bilinear (good balance of speed and quality)
/// - 2 = Lanczos3 (best quality, slowest)
///
/// Any other value defaults to Bilinear.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        2 => FilterType::Lanczos3,
        _ => FilterType::Bilinear,
    }
}
