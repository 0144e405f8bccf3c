//! Scan tasks: the individual corrections a pipeline applies in order.
//!
//! Every task is an immutable value that validates its parameters when it is
//! built, runs against a [`ScanImage`], and round-trips through a
//! `{type: <name>, ...fields}` record.
//!
//! # Coordinate System
//!
//! - Crop and corner coordinates are normalized (0.0 to 1.0) relative to the
//!   dimensions of the buffer the task runs on
//! - Origin is the top-left corner
//! - Rotation angles are integer degrees, positive = clockwise
//!
//! # Identity Shortcut
//!
//! A task whose parameters cannot change the image returns the buffer it was
//! given without touching the raster code. The result may therefore be the
//! caller's own allocation.

mod adjustment;
mod correction;
mod crop;
mod mirror;
pub mod registry;
mod rotation;
mod zoom;

pub use adjustment::Adjustment;
pub use correction::PerspectiveCorrection;
pub use crop::Cropping;
pub use mirror::Mirror;
pub use rotation::{compute_rotated_bounds, Rotation};
pub use zoom::{Zoom, MAX_OUTPUT_PIXELS};

use image::RgbImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::buffer::ScanImage;
use crate::error::{Result, ScanError};
use crate::options::ScanOptions;

/// Behavior shared by every task variant.
pub trait ScanTask {
    /// Discriminator written to the record's `type` field.
    const TYPE_NAME: &'static str;

    /// True when running the task would leave any buffer unchanged.
    fn is_identity(&self) -> bool;

    /// Run the raster step. Only called when [`ScanTask::is_identity`] is false.
    fn render(&self, image: ScanImage, options: &ScanOptions) -> Result<ScanImage>;

    /// Serialize to a tagged record.
    fn to_record(&self) -> Value;

    /// Rebuild from a tagged record, running the same validation as the
    /// constructor.
    fn from_record(value: &Value) -> Result<Self>
    where
        Self: Sized;

    /// Apply the task with explicit options.
    fn apply(&self, image: ScanImage, options: &ScanOptions) -> Result<ScanImage> {
        if self.is_identity() {
            debug!(task = Self::TYPE_NAME, "identity parameters, returning input");
            return Ok(image);
        }
        self.render(image, options)
    }

    /// Apply the task with default options.
    fn run(&self, image: ScanImage) -> Result<ScanImage> {
        self.apply(image, &ScanOptions::default())
    }
}

/// Any one of the supported tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Cropping(Cropping),
    Correction(PerspectiveCorrection),
    Rotation(Rotation),
    Mirror(Mirror),
    Zoom(Zoom),
    Adjustment(Adjustment),
}

macro_rules! dispatch {
    ($task:expr, $inner:ident => $body:expr) => {
        match $task {
            Task::Cropping($inner) => $body,
            Task::Correction($inner) => $body,
            Task::Rotation($inner) => $body,
            Task::Mirror($inner) => $body,
            Task::Zoom($inner) => $body,
            Task::Adjustment($inner) => $body,
        }
    };
}

impl Task {
    /// Discriminator of the wrapped variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Task::Cropping(_) => Cropping::TYPE_NAME,
            Task::Correction(_) => PerspectiveCorrection::TYPE_NAME,
            Task::Rotation(_) => Rotation::TYPE_NAME,
            Task::Mirror(_) => Mirror::TYPE_NAME,
            Task::Zoom(_) => Zoom::TYPE_NAME,
            Task::Adjustment(_) => Adjustment::TYPE_NAME,
        }
    }

    pub fn is_identity(&self) -> bool {
        dispatch!(self, t => t.is_identity())
    }

    pub fn apply(&self, image: ScanImage, options: &ScanOptions) -> Result<ScanImage> {
        dispatch!(self, t => t.apply(image, options))
    }

    pub fn run(&self, image: ScanImage) -> Result<ScanImage> {
        self.apply(image, &ScanOptions::default())
    }

    pub fn to_record(&self) -> Value {
        dispatch!(self, t => t.to_record())
    }

    /// Resolve a record of any registered type.
    pub fn from_record(value: &Value) -> Result<Self> {
        registry::resolve(value)
    }

    pub fn to_json(&self) -> String {
        self.to_record().to_string()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_record(&value)
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Task {
                fn from(task: $ty) -> Self {
                    Task::$variant(task)
                }
            }
        )*
    };
}

impl_from_variant!(
    Cropping(Cropping),
    Correction(PerspectiveCorrection),
    Rotation(Rotation),
    Mirror(Mirror),
    Zoom(Zoom),
    Adjustment(Adjustment),
);

impl Serialize for Task {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Task {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Task::from_record(&value).map_err(serde::de::Error::custom)
    }
}

/// Hand a buffer to the `image` crate, failing if its length is inconsistent.
pub(crate) fn into_rgb(image: ScanImage, task: &str) -> Result<RgbImage> {
    let (width, height, len) = (image.width, image.height, image.pixels.len());
    image.into_rgb_image().ok_or_else(|| {
        ScanError::ExecutionFailure(format!(
            "{task}: {len} bytes do not describe a {width}x{height} RGB image"
        ))
    })
}

/// Reject NaN and infinities before range checks.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(crate::error::invalid_param!("{name} must be finite, got {value}"))
    }
}
