//! Closed registry mapping record discriminators to task factories.
//!
//! Only the names listed here can be instantiated from a record. Anything
//! else is rejected with [`ScanError::UnknownVariant`] before any task code
//! runs.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;

use super::{
    Adjustment, Cropping, Mirror, PerspectiveCorrection, Rotation, ScanTask, Task, Zoom,
};
use crate::error::{Result, ScanError};
use crate::record;

/// Builds a task from its record.
pub type TaskFactory = fn(&Value) -> Result<Task>;

fn factory<T>(value: &Value) -> Result<Task>
where
    T: ScanTask + Into<Task>,
{
    T::from_record(value).map(Into::into)
}

fn entry<T>() -> (&'static str, TaskFactory)
where
    T: ScanTask + Into<Task>,
{
    (T::TYPE_NAME, factory::<T> as TaskFactory)
}

fn registry() -> &'static HashMap<&'static str, TaskFactory> {
    static REGISTRY: OnceLock<HashMap<&'static str, TaskFactory>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        HashMap::from([
            entry::<Cropping>(),
            entry::<PerspectiveCorrection>(),
            entry::<Rotation>(),
            entry::<Mirror>(),
            entry::<Zoom>(),
            entry::<Adjustment>(),
        ])
    })
}

/// Factory registered for `name`, if any.
pub fn lookup(name: &str) -> Option<TaskFactory> {
    registry().get(name).copied()
}

/// Every registered discriminator, sorted.
pub fn task_types() -> Vec<&'static str> {
    let mut names: Vec<_> = registry().keys().copied().collect();
    names.sort_unstable();
    names
}

/// Read a record's discriminator and build the matching task.
///
/// # Errors
///
/// - `MalformedRecord` if the record has no string `type` field, or the
///   variant rejects the record's shape
/// - `UnknownVariant` if the name is not registered
/// - `InvalidParameter` if the variant's validation fails
pub fn resolve(value: &Value) -> Result<Task> {
    let name = record::discriminator(value)?;
    let factory = lookup(name).ok_or_else(|| ScanError::UnknownVariant(name.to_string()))?;
    factory(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_types() {
        assert_eq!(
            task_types(),
            vec![
                "AdjustmentScanTask",
                "CorrectionScanTask",
                "CroppingScanTask",
                "MirrorScanTask",
                "RotatingScanTask",
                "ZoomScanTask",
            ]
        );
    }

    #[test]
    fn test_resolve_each_variant() {
        let records = [
            json!({"type": "CroppingScanTask", "x": 0.0, "y": 0.0, "width": 0.5, "height": 0.5}),
            json!({"type": "AdjustmentScanTask", "contrast": 0.2, "brightness": -0.1}),
            json!({"type": "MirrorScanTask", "x": true, "y": true}),
            json!({"type": "ZoomScanTask", "x": 2.0, "y": 2.0}),
            json!({"type": "RotatingScanTask", "angle": 90}),
        ];
        for record in records {
            let task = resolve(&record).unwrap();
            assert_eq!(task.type_name(), record["type"].as_str().unwrap());
        }
    }

    #[test]
    fn test_unknown_variant() {
        let record = json!({"type": "UnknownTask"});
        assert!(matches!(
            resolve(&record),
            Err(ScanError::UnknownVariant(name)) if name == "UnknownTask"
        ));
    }

    #[test]
    fn test_suffix_is_not_enough() {
        // Names are matched exactly, not by convention
        let record = json!({"type": "EvilScanTask", "x": 1.0});
        assert!(matches!(resolve(&record), Err(ScanError::UnknownVariant(_))));
        assert!(lookup("scantask").is_none());
        assert!(lookup("croppingscantask").is_none());
    }

    #[test]
    fn test_missing_discriminator() {
        let record = json!({"x": 1.0, "y": 1.0});
        assert!(matches!(resolve(&record), Err(ScanError::MalformedRecord(_))));
    }

    #[test]
    fn test_factory_validation_propagates() {
        let record = json!({"type": "ZoomScanTask", "x": 0.0, "y": 1.0});
        assert!(matches!(resolve(&record), Err(ScanError::InvalidParameter(_))));
    }
}
