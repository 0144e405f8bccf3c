//! Helpers for the `{type: <name>, ...fields}` record shape.
//!
//! Every task and point serializes its own fields with serde and then gets
//! the discriminator prepended here. On the way back the discriminator is
//! checked before the fields are decoded.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, ScanError};

/// Field holding the discriminator.
pub const TYPE_FIELD: &str = "type";

/// Serialize `fields` and put `type: type_name` in front of them.
pub(crate) fn tagged<T: Serialize>(type_name: &str, fields: &T) -> Value {
    let mut map = Map::new();
    map.insert(TYPE_FIELD.to_string(), Value::String(type_name.to_string()));
    match serde_json::to_value(fields) {
        Ok(Value::Object(body)) => map.extend(body),
        other => debug_assert!(false, "record body must be an object, got {other:?}"),
    }
    Value::Object(map)
}

/// Read the discriminator of a record.
pub fn discriminator(value: &Value) -> Result<&str> {
    let object = value
        .as_object()
        .ok_or_else(|| ScanError::MalformedRecord(format!("expected an object, got {value}")))?;
    match object.get(TYPE_FIELD) {
        Some(Value::String(name)) => Ok(name),
        Some(other) => Err(ScanError::MalformedRecord(format!(
            "`type` must be a string, got {other}"
        ))),
        None => Err(ScanError::MalformedRecord("missing `type` field".to_string())),
    }
}

/// Fail unless the record's discriminator is `expected`.
pub(crate) fn expect_type(expected: &str, value: &Value) -> Result<()> {
    let found = discriminator(value)?;
    if found != expected {
        return Err(ScanError::MalformedRecord(format!(
            "expected type `{expected}`, found `{found}`"
        )));
    }
    Ok(())
}

/// Check the discriminator, then decode the remaining fields into `T`.
pub(crate) fn untagged<T: DeserializeOwned>(expected: &str, value: &Value) -> Result<T> {
    expect_type(expected, value)?;
    T::deserialize(value).map_err(|e| ScanError::MalformedRecord(format!("{expected}: {e}")))
}
