//! Domain entities handed to the metrics engine by the request layer.
//!
//! Entities arrive either as typed values or as the JSON maps the request
//! layer forwards after a durable insert. Identity fields are always
//! required; descriptive fields may default.

pub mod doctor;
pub mod enums;
pub mod record;
pub mod timestamp;
pub mod treatment;

pub use doctor::*;
pub use enums::*;
pub use record::*;
pub use timestamp::*;
pub use treatment::*;

use serde_json::{Map, Value};
use thiserror::Error;

pub type RecordId = i64;
pub type UserId = i64;
pub type DoctorId = i64;
pub type TreatmentId = i64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Expected a JSON object for {entity}")]
    NotAnObject { entity: &'static str },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid ISO-8601 timestamp for {field}: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}

// ═══════════════════════════════════════════════════════════
// JSON field access
// ═══════════════════════════════════════════════════════════

pub(crate) fn as_object<'a>(
    value: &'a Value,
    entity: &'static str,
) -> Result<&'a Map<String, Value>, ModelError> {
    value.as_object().ok_or(ModelError::NotAnObject { entity })
}

/// A present, non-null field. `null` counts as missing.
fn present<'a>(map: &'a Map<String, Value>, field: &'static str) -> Option<&'a Value> {
    map.get(field).filter(|v| !v.is_null())
}

pub(crate) fn require_id(map: &Map<String, Value>, field: &'static str) -> Result<i64, ModelError> {
    let value = present(map, field).ok_or(ModelError::MissingField { field })?;
    value.as_i64().ok_or_else(|| ModelError::InvalidField {
        field,
        reason: format!("expected an integer id, got {value}"),
    })
}

pub(crate) fn require_str<'a>(
    map: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ModelError> {
    optional_str(map, field)?.ok_or(ModelError::MissingField { field })
}

pub(crate) fn optional_str<'a>(
    map: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, ModelError> {
    match present(map, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ModelError::InvalidField {
            field,
            reason: format!("expected a string, got {other}"),
        }),
    }
}

pub(crate) fn optional_u32(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<u32>, ModelError> {
    let Some(value) = present(map, field) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| ModelError::InvalidField {
            field,
            reason: format!("expected a non-negative integer, got {value}"),
        })
}

pub(crate) fn optional_f64(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<f64>, ModelError> {
    let Some(value) = present(map, field) else {
        return Ok(None);
    };
    value.as_f64().map(Some).ok_or_else(|| ModelError::InvalidField {
        field,
        reason: format!("expected a number, got {value}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_id_reports_missing_field() {
        let value = json!({"user_id": 1});
        let map = as_object(&value, "record").unwrap();
        assert_eq!(
            require_id(map, "record_id").unwrap_err(),
            ModelError::MissingField { field: "record_id" }
        );
    }

    #[test]
    fn null_counts_as_missing() {
        let value = json!({"record_id": null});
        let map = as_object(&value, "record").unwrap();
        assert_eq!(
            require_id(map, "record_id").unwrap_err(),
            ModelError::MissingField { field: "record_id" }
        );
    }

    #[test]
    fn non_integer_id_is_invalid() {
        let value = json!({"record_id": "seven"});
        let map = as_object(&value, "record").unwrap();
        match require_id(map, "record_id").unwrap_err() {
            ModelError::InvalidField { field, .. } => assert_eq!(field, "record_id"),
            other => panic!("Expected InvalidField, got: {other}"),
        }
    }

    #[test]
    fn non_object_rejected() {
        let value = json!([1, 2, 3]);
        assert_eq!(
            as_object(&value, "doctor").unwrap_err(),
            ModelError::NotAnObject { entity: "doctor" }
        );
    }

    #[test]
    fn optional_fields_default_to_none() {
        let value = json!({"file_path": null});
        let map = as_object(&value, "record").unwrap();
        assert_eq!(optional_str(map, "file_path").unwrap(), None);
        assert_eq!(optional_u32(map, "patient_count").unwrap(), None);
        assert_eq!(optional_f64(map, "avg_severity_score").unwrap(), None);
    }

    #[test]
    fn negative_patient_count_is_invalid() {
        let value = json!({"patient_count": -3});
        let map = as_object(&value, "doctor").unwrap();
        assert!(optional_u32(map, "patient_count").is_err());
    }
}
