//! Rescan WASM - WebAssembly bindings for the rescan pipeline
//!
//! This crate exposes rescan-core's scan pipeline to JavaScript/TypeScript
//! applications.
//!
//! # Module Structure
//!
//! - `types` - RGBA image wrapper matching canvas `ImageData`
//! - `pipeline` - Pipeline construction, storage and execution
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsScanImage, JsScanPipeline } from '@rescan/wasm';
//!
//! await init();
//!
//! const pipeline = JsScanPipeline.fromJson(savedJson);
//! const data = ctx.getImageData(0, 0, canvas.width, canvas.height);
//! const scanned = pipeline.run(new JsScanImage(data.width, data.height, data.data));
//! ```

use wasm_bindgen::prelude::*;

mod pipeline;
mod types;

pub use pipeline::JsScanPipeline;
pub use types::JsScanImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// List every task type a pipeline record may contain.
#[wasm_bindgen(js_name = taskTypes)]
pub fn task_types() -> js_sys::Array {
    rescan_core::task_types()
        .into_iter()
        .map(JsValue::from_str)
        .collect()
}
