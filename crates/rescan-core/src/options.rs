//! Rendering options shared by the raster steps of every task.

use imageproc::geometric_transformations::Interpolation;
use serde::{Deserialize, Serialize};

/// Interpolation used when a task resamples pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 for resizing, bicubic for warps (slowest, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }

    /// Convert to imageproc's warp interpolation.
    ///
    /// imageproc has no Lanczos warp, so the high quality setting maps to
    /// bicubic.
    pub fn to_warp_interpolation(self) -> Interpolation {
        match self {
            FilterType::Nearest => Interpolation::Nearest,
            FilterType::Bilinear => Interpolation::Bilinear,
            FilterType::Lanczos3 => Interpolation::Bicubic,
        }
    }
}

/// Options applied while running tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Resampling filter for zoom, rotation and perspective correction.
    pub filter: FilterType,
    /// RGB fill for output pixels that have no source pixel after a warp.
    pub background: [u8; 3],
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            filter: FilterType::Bilinear,
            background: [0, 0, 0],
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.filter, FilterType::Bilinear);
        assert_eq!(options.background, [0, 0, 0]);
    }

    #[test]
    fn test_builder() {
        let options = ScanOptions::new()
            .with_filter(FilterType::Nearest)
            .with_background([255, 255, 255]);
        assert_eq!(options.filter, FilterType::Nearest);
        assert_eq!(options.background, [255, 255, 255]);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let options: ScanOptions = serde_json::from_str(r#"{"filter":"lanczos3"}"#).unwrap();
        assert_eq!(options.filter, FilterType::Lanczos3);
        assert_eq!(options.background, [0, 0, 0]);
    }

    #[test]
    fn test_warp_interpolation_mapping() {
        assert!(matches!(
            FilterType::Nearest.to_warp_interpolation(),
            Interpolation::Nearest
        ));
        assert!(matches!(
            FilterType::Lanczos3.to_warp_interpolation(),
            Interpolation::Bicubic
        ));
    }
}
