//! WASM bindings for building, storing and running scan pipelines.

use crate::types::{filter_from_u8, JsScanImage};
use rescan_core::{
    Adjustment, Cropping, Mirror, PerspectiveCorrection, RelativePoint, Rotation, ScanError,
    ScanOptions, ScanPipeline, Task, Zoom,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Surface a core error as a JS exception carrying its message.
fn js_error(err: ScanError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A scan pipeline for JavaScript.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const pipeline = new JsScanPipeline();
/// pipeline.addCorrection(new Float64Array([0.05, 0.02, 0.97, 0.0, 1.0, 0.98, 0.02, 1.0]));
/// pipeline.addAdjustment(0.2, 0.05);
///
/// const image = new JsScanImage(data.width, data.height, data.data);
/// const scanned = pipeline.run(image);
///
/// localStorage.setItem('pipeline', pipeline.toJson());
/// ```
#[wasm_bindgen]
pub struct JsScanPipeline {
    inner: ScanPipeline,
}

#[wasm_bindgen]
impl JsScanPipeline {
    /// Create an empty pipeline with default options.
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsScanPipeline {
        JsScanPipeline {
            inner: ScanPipeline::new(),
        }
    }

    /// Create an empty pipeline with a resampling filter and background.
    ///
    /// # Arguments
    /// * `filter` - 0 = nearest, 1 = bilinear, 2 = lanczos3
    /// * `background` - RGB fill for uncovered pixels (3 bytes)
    #[wasm_bindgen(js_name = withOptions)]
    pub fn with_options(filter: u8, background: &[u8]) -> Result<JsScanPipeline, JsValue> {
        let background: [u8; 3] = background.try_into().map_err(|_| {
            js_error(ScanError::InvalidParameter(format!(
                "background needs 3 bytes, got {}",
                background.len()
            )))
        })?;
        let options = ScanOptions::new()
            .with_filter(filter_from_u8(filter))
            .with_background(background);
        Ok(JsScanPipeline {
            inner: ScanPipeline::with_options(options),
        })
    }

    /// Rebuild a pipeline from its JSON record.
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<JsScanPipeline, JsValue> {
        let inner = ScanPipeline::from_json(json).map_err(js_error)?;
        Ok(JsScanPipeline { inner })
    }

    /// Serialize to a JSON string for storage.
    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> String {
        self.inner.to_json()
    }

    /// Serialize to a plain JS object (`{tasks: [...]}`).
    #[wasm_bindgen(js_name = toRecord)]
    pub fn to_record(&self) -> Result<JsValue, JsValue> {
        self.inner
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Rebuild a pipeline from a plain JS object.
    #[wasm_bindgen(js_name = fromRecord)]
    pub fn from_record(value: JsValue) -> Result<JsScanPipeline, JsValue> {
        let inner: ScanPipeline =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(JsScanPipeline { inner })
    }

    /// Append a crop in relative coordinates.
    #[wasm_bindgen(js_name = addCrop)]
    pub fn add_crop(&self, x: f64, y: f64, width: f64, height: f64) -> Result<(), JsValue> {
        let task = Cropping::new(x, y, width, height).map_err(js_error)?;
        self.inner.append(task);
        Ok(())
    }

    /// Append a perspective correction.
    ///
    /// `corners` holds 8 relative coordinates as x, y pairs in top-left,
    /// top-right, bottom-right, bottom-left order.
    #[wasm_bindgen(js_name = addCorrection)]
    pub fn add_correction(&self, corners: &[f64]) -> Result<(), JsValue> {
        let task = correction_from_flat(corners).map_err(js_error)?;
        self.inner.append(task);
        Ok(())
    }

    /// Append a rotation in whole degrees, positive = clockwise.
    #[wasm_bindgen(js_name = addRotation)]
    pub fn add_rotation(&self, angle: i32) {
        self.inner.append(Rotation::new(angle));
    }

    /// Append a horizontal and/or vertical flip.
    #[wasm_bindgen(js_name = addMirror)]
    pub fn add_mirror(&self, x: bool, y: bool) {
        self.inner.append(Mirror::new(x, y));
    }

    /// Append a scale by independent horizontal and vertical factors.
    #[wasm_bindgen(js_name = addZoom)]
    pub fn add_zoom(&self, x: f64, y: f64) -> Result<(), JsValue> {
        let task = Zoom::new(x, y).map_err(js_error)?;
        self.inner.append(task);
        Ok(())
    }

    /// Append a contrast/brightness adjustment, both in [-1, 1].
    #[wasm_bindgen(js_name = addAdjustment)]
    pub fn add_adjustment(&self, contrast: f64, brightness: f64) -> Result<(), JsValue> {
        let task = Adjustment::new(contrast, brightness).map_err(js_error)?;
        self.inner.append(task);
        Ok(())
    }

    /// Append any task from its JSON record.
    #[wasm_bindgen(js_name = addTaskJson)]
    pub fn add_task_json(&self, json: &str) -> Result<(), JsValue> {
        let task = Task::from_json(json).map_err(js_error)?;
        self.inner.append(task);
        Ok(())
    }

    /// Remove every task.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Number of tasks in the pipeline.
    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }

    /// Run every task on the image, returning a new image.
    ///
    /// The source image is left untouched.
    pub fn run(&self, image: &JsScanImage) -> Result<JsScanImage, JsValue> {
        self.inner.run(image.clone()).map_err(js_error)
    }
}

impl Default for JsScanPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl JsScanPipeline {
    /// Get a reference to the core pipeline.
    #[cfg(test)]
    pub(crate) fn inner(&self) -> &ScanPipeline {
        &self.inner
    }
}

fn correction_from_flat(corners: &[f64]) -> rescan_core::Result<PerspectiveCorrection> {
    let coords: &[f64; 8] = corners.try_into().map_err(|_| {
        ScanError::InvalidParameter(format!(
            "perspective correction needs 8 coordinates, got {}",
            corners.len()
        ))
    })?;
    let [tlx, tly, trx, try_, brx, bry, blx, bly] = *coords;
    PerspectiveCorrection::new(
        RelativePoint::new(tlx, tly),
        RelativePoint::new(trx, try_),
        RelativePoint::new(brx, bry),
        RelativePoint::new(blx, bly),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescan_core::ScanTask;

    /// Create an opaque RGBA test image.
    fn test_image(width: u32, height: u32) -> JsScanImage {
        let pixels: Vec<u8> = (0..width * height)
            .flat_map(|i| [(i % 256) as u8, (i / 256 % 256) as u8, 7, 255])
            .collect();
        JsScanImage::new(width, height, pixels)
    }

    #[test]
    fn test_empty_pipeline_copies_image() {
        let pipeline = JsScanPipeline::new();
        let img = test_image(10, 10);
        let result = pipeline.run(&img).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_builders_append_in_order() {
        let pipeline = JsScanPipeline::new();
        pipeline.add_crop(0.1, 0.1, 0.8, 0.8).unwrap();
        pipeline
            .add_correction(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0])
            .unwrap();
        pipeline.add_rotation(90);
        pipeline.add_mirror(true, false);
        pipeline.add_zoom(0.5, 0.5).unwrap();
        pipeline.add_adjustment(0.1, 0.1).unwrap();
        assert_eq!(pipeline.length(), 6);

        let names: Vec<_> = pipeline.inner().tasks().iter().map(Task::type_name).collect();
        assert_eq!(
            names,
            vec![
                "CroppingScanTask",
                "CorrectionScanTask",
                "RotatingScanTask",
                "MirrorScanTask",
                "ZoomScanTask",
                "AdjustmentScanTask",
            ]
        );

        pipeline.clear();
        assert_eq!(pipeline.length(), 0);
    }

    #[test]
    fn test_run_rotation() {
        let pipeline = JsScanPipeline::new();
        pipeline.add_rotation(90);
        let result = pipeline.run(&test_image(100, 50)).unwrap();
        // 90-degree rotation swaps dimensions
        assert_eq!(result.width(), 50);
        assert_eq!(result.height(), 100);
        assert_eq!(result.byte_length(), 50 * 100 * 4);
    }

    #[test]
    fn test_run_crop_leaves_source_untouched() {
        let pipeline = JsScanPipeline::new();
        pipeline.add_crop(0.25, 0.25, 0.5, 0.5).unwrap();
        let img = test_image(100, 100);
        let before = img.pixels();
        let result = pipeline.run(&img).unwrap();
        assert_eq!((result.width(), result.height()), (50, 50));
        assert_eq!(img.pixels(), before);
    }

    #[test]
    fn test_json_round_trip() {
        let pipeline = JsScanPipeline::new();
        pipeline.add_mirror(false, true);
        pipeline.add_adjustment(-0.5, 0.25).unwrap();

        let json = pipeline.to_json();
        let restored = JsScanPipeline::from_json(&json).unwrap();
        assert_eq!(restored.inner().tasks(), pipeline.inner().tasks());
        assert_eq!(restored.to_json(), json);
    }

    #[test]
    fn test_add_task_json() {
        let pipeline = JsScanPipeline::new();
        pipeline
            .add_task_json(r#"{"type": "ZoomScanTask", "x": 2.0, "y": 2.0}"#)
            .unwrap();
        assert_eq!(pipeline.inner().tasks()[0].type_name(), Zoom::TYPE_NAME);
    }

    #[test]
    fn test_with_options() {
        let pipeline = JsScanPipeline::with_options(0, &[255, 255, 255]).unwrap();
        assert_eq!(pipeline.inner().options().background, [255, 255, 255]);
        pipeline.add_rotation(45);
        let result = pipeline.run(&test_image(20, 20)).unwrap();
        // Corner of the expanded canvas takes the background
        assert_eq!(&result.pixels()[..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_correction_from_flat() {
        let task = correction_from_flat(&[0.1, 0.1, 0.9, 0.1, 0.9, 0.9, 0.1, 0.9]).unwrap();
        assert_eq!(task.corners()[2], RelativePoint::new(0.9, 0.9));

        assert!(matches!(
            correction_from_flat(&[0.0; 6]),
            Err(ScanError::InvalidParameter(_))
        ));
        // Top-right left of top-left
        assert!(matches!(
            correction_from_flat(&[0.9, 0.1, 0.1, 0.1, 0.9, 0.9, 0.1, 0.9]),
            Err(ScanError::InvalidParameter(_))
        ));
    }
}
