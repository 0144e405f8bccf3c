//! Rescan Core - document scan correction pipeline
//!
//! This crate turns a photographed page into a clean scan by running an
//! ordered list of tasks (crop, perspective correction, rotation, mirror,
//! zoom, contrast/brightness) over an RGB buffer. Pipelines serialize to a
//! tagged JSON record so they can be stored and replayed.

pub mod adapter;
pub mod buffer;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod point;
pub mod record;
pub mod task;

pub use adapter::ScanSource;
pub use buffer::ScanImage;
pub use error::{Result, ScanError};
pub use options::{FilterType, ScanOptions};
pub use pipeline::ScanPipeline;
pub use point::{AbsolutePoint, RelativePoint};
pub use task::registry::task_types;
pub use task::{
    compute_rotated_bounds, Adjustment, Cropping, Mirror, PerspectiveCorrection, Rotation,
    ScanTask, Task, Zoom,
};
