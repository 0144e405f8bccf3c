//! Ordered sequence of tasks executed as one unit.
//!
//! A pipeline owns its task list behind a single lock. Appending, clearing
//! and running are mutually exclusive on the same pipeline, and a run holds
//! the lock for the whole fold, so a task list can never change under a run
//! in progress.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::adapter::ScanSource;
use crate::buffer::ScanImage;
use crate::error::{Result, ScanError};
use crate::options::ScanOptions;
use crate::task::Task;

/// Key holding the ordered task records.
const TASKS_FIELD: &str = "tasks";

/// A mutable, ordered list of scan tasks.
///
/// # Example
///
/// ```ignore
/// use rescan_core::{Cropping, Mirror, ScanPipeline};
///
/// let pipeline = ScanPipeline::new();
/// pipeline.append(Cropping::new(0.0, 0.0, 0.5, 0.5)?);
/// pipeline.append(Mirror::new(true, false));
/// let output = pipeline.run(image)?;
/// ```
#[derive(Debug, Default)]
pub struct ScanPipeline {
    tasks: Mutex<Vec<Task>>,
    options: ScanOptions,
}

impl ScanPipeline {
    /// Empty pipeline with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty pipeline with the given filter and background.
    pub fn with_options(options: ScanOptions) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            options,
        }
    }

    pub fn options(&self) -> ScanOptions {
        self.options
    }

    /// Add a task to the end of the list.
    pub fn append(&self, task: impl Into<Task>) {
        self.lock().push(task.into());
    }

    /// Remove every task.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current task list.
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().clone()
    }

    /// Run every task on a host image and convert the result back.
    ///
    /// # Errors
    ///
    /// - `UnsupportedBufferKind` if the host image cannot be adapted
    /// - any error from the first failing task; no partial result is returned
    pub fn run<I: ScanSource>(&self, image: I) -> Result<I> {
        let buffer = image.into_scan_image()?;
        let output = self.run_buffer(buffer)?;
        I::from_scan_image(output)
    }

    /// Fold every task over the buffer, left to right.
    #[instrument(skip(self, image), fields(width = image.width, height = image.height))]
    pub fn run_buffer(&self, image: ScanImage) -> Result<ScanImage> {
        let tasks = self.lock();
        info!(tasks = tasks.len(), "Running scan pipeline");

        let mut current = image;
        for (index, task) in tasks.iter().enumerate() {
            let (in_w, in_h) = (current.width, current.height);
            current = task.apply(current, &self.options).map_err(|err| {
                warn!(index, task = task.type_name(), error = %err, "Scan task failed");
                err
            })?;
            debug!(
                index,
                task = task.type_name(),
                in_w,
                in_h,
                out_w = current.width,
                out_h = current.height,
                "Applied scan task"
            );
        }

        info!(
            width = current.width,
            height = current.height,
            "Scan pipeline finished"
        );
        Ok(current)
    }

    /// Serialize as `{tasks: [...]}` in execution order.
    pub fn to_record(&self) -> Value {
        let records: Vec<Value> = self.lock().iter().map(Task::to_record).collect();
        json!({ TASKS_FIELD: records })
    }

    pub fn to_json(&self) -> String {
        self.to_record().to_string()
    }

    /// Rebuild a pipeline from its record, with default options.
    ///
    /// Every element is resolved before the pipeline is built, so a failure
    /// never leaves a partially populated pipeline behind.
    ///
    /// # Errors
    ///
    /// - `MalformedRecord` if there is no `tasks` array or an element is
    ///   malformed
    /// - `UnknownVariant` if an element names an unregistered task
    /// - `InvalidParameter` if an element fails validation
    pub fn from_record(value: &Value) -> Result<Self> {
        let records = value
            .get(TASKS_FIELD)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ScanError::MalformedRecord(format!("pipeline record needs a `{TASKS_FIELD}` array"))
            })?;

        let tasks = records
            .iter()
            .map(Task::from_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(tasks.into_iter().collect())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_record(&value)
    }

    // The task list only ever holds complete, immutable values, so a panic
    // in another holder cannot leave it inconsistent.
    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FromIterator<Task> for ScanPipeline {
    fn from_iter<T: IntoIterator<Item = Task>>(iter: T) -> Self {
        Self {
            tasks: Mutex::new(iter.into_iter().collect()),
            options: ScanOptions::default(),
        }
    }
}

impl Clone for ScanPipeline {
    fn clone(&self) -> Self {
        Self {
            tasks: Mutex::new(self.tasks()),
            options: self.options,
        }
    }
}

impl PartialEq for ScanPipeline {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.options == other.options && self.tasks() == other.tasks()
    }
}

impl Serialize for ScanPipeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScanPipeline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ScanPipeline::from_record(&value).map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::task::{Adjustment, Cropping, Mirror, Rotation, Zoom};
    use proptest::prelude::*;

    fn task_strategy() -> impl Strategy<Value = Task> {
        prop_oneof![
            (0.0f64..0.5, 0.0f64..0.5, 0.1f64..=0.5, 0.1f64..=0.5)
                .prop_map(|(x, y, w, h)| Cropping::new(x, y, w, h).unwrap().into()),
            (any::<bool>(), any::<bool>()).prop_map(|(x, y)| Mirror::new(x, y).into()),
            (0.1f64..10.0, 0.1f64..10.0).prop_map(|(x, y)| Zoom::new(x, y).unwrap().into()),
            (-720i32..720).prop_map(|angle| Rotation::new(angle).into()),
            (-1.0f64..=1.0, -1.0f64..=1.0)
                .prop_map(|(c, b)| Adjustment::new(c, b).unwrap().into()),
        ]
    }

    proptest! {
        /// Property: any task sequence survives a JSON round trip in order.
        #[test]
        fn prop_record_round_trip(tasks in prop::collection::vec(task_strategy(), 0..12)) {
            let pipeline: ScanPipeline = tasks.clone().into_iter().collect();
            let restored = ScanPipeline::from_json(&pipeline.to_json()).unwrap();
            prop_assert_eq!(restored.tasks(), tasks);
        }

        /// Property: mirrors only permute pixels, so dimensions never change.
        #[test]
        fn prop_mirrors_keep_dimensions(
            flips in prop::collection::vec((any::<bool>(), any::<bool>()), 0..6),
            width in 1u32..16,
            height in 1u32..16,
        ) {
            let pipeline: ScanPipeline = flips
                .into_iter()
                .map(|(x, y)| Mirror::new(x, y).into())
                .collect();
            let img = ScanImage::filled(width, height, [5, 6, 7]);
            let result = pipeline.run_buffer(img.clone()).unwrap();
            prop_assert_eq!(result, img);
        }
    }
}
