//! Error type shared by every task, the pipeline and the image adapters.

use thiserror::Error;

/// Errors produced while building, loading or running a scan pipeline.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A task constructor rejected its parameters.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A serialized record could not be parsed, lacks a field, or names the
    /// wrong variant.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The record's discriminator has no registered task.
    #[error("unknown task type: {0}")]
    UnknownVariant(String),

    /// A task could not produce an output buffer.
    #[error("task execution failed: {0}")]
    ExecutionFailure(String),

    /// The image adapter does not understand the given host image.
    #[error("unsupported image kind: {0}")]
    UnsupportedBufferKind(String),
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::MalformedRecord(err.to_string())
    }
}

/// Alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Build an `InvalidParameter` error from a format string.
macro_rules! invalid_param {
    ($($arg:tt)*) => {
        $crate::error::ScanError::InvalidParameter(format!($($arg)*))
    };
}

pub(crate) use invalid_param;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_becomes_malformed_record() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ScanError = err.into();
        assert!(matches!(err, ScanError::MalformedRecord(_)));
    }

    #[test]
    fn test_display_messages() {
        let err = ScanError::UnknownVariant("UnknownTask".to_string());
        assert_eq!(err.to_string(), "unknown task type: UnknownTask");

        let err = invalid_param!("zoom x must be positive, got {}", -1.0);
        assert_eq!(err.to_string(), "invalid parameter: zoom x must be positive, got -1");
    }
}
