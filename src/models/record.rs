use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    as_object, optional_str, parse_timestamp, require_id, require_str, DoctorId, ModelError,
    RecordId, Severity, UserId,
};
use crate::severity::classify;

/// A health record as indexed by the engine.
///
/// Severity is derived from the diagnosis once, at construction, and cannot
/// be set independently. Fields are read-only after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecord {
    record_id: RecordId,
    user_id: UserId,
    doctor_id: DoctorId,
    diagnosis: String,
    record_date: NaiveDateTime,
    severity: Severity,
    file_path: Option<String>,
}

impl HealthRecord {
    pub fn new(
        record_id: RecordId,
        user_id: UserId,
        doctor_id: DoctorId,
        diagnosis: impl Into<String>,
        record_date: NaiveDateTime,
        file_path: Option<String>,
    ) -> Self {
        let diagnosis = diagnosis.into();
        let severity = classify(&diagnosis);
        Self {
            record_id,
            user_id,
            doctor_id,
            diagnosis,
            record_date,
            severity,
            file_path,
        }
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn doctor_id(&self) -> DoctorId {
        self.doctor_id
    }

    pub fn diagnosis(&self) -> &str {
        &self.diagnosis
    }

    pub fn record_date(&self) -> NaiveDateTime {
        self.record_date
    }

    pub fn year(&self) -> i32 {
        self.record_date.year()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }
}

/// Record payload forwarded after a durable insert.
/// `record_date` is still the raw ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHealthRecord {
    pub record_id: RecordId,
    pub user_id: UserId,
    pub doctor_id: DoctorId,
    pub diagnosis: String,
    pub record_date: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

impl NewHealthRecord {
    /// Read a payload out of a JSON map, naming the first missing field.
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        let map = as_object(value, "health record")?;
        Ok(Self {
            record_id: require_id(map, "record_id")?,
            user_id: require_id(map, "user_id")?,
            doctor_id: require_id(map, "doctor_id")?,
            diagnosis: require_str(map, "diagnosis")?.to_string(),
            record_date: require_str(map, "record_date")?.to_string(),
            file_path: optional_str(map, "file_path")?.map(str::to_string),
        })
    }

    /// Parse the date and build the indexed record.
    pub fn into_record(self) -> Result<HealthRecord, ModelError> {
        let record_date = parse_timestamp("record_date", &self.record_date)?;
        Ok(HealthRecord::new(
            self.record_id,
            self.user_id,
            self.doctor_id,
            self.diagnosis,
            record_date,
            self.file_path,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn severity_derived_at_construction() {
        let date = parse_timestamp("record_date", "2024-01-01").unwrap();
        let record = HealthRecord::new(1, 10, 100, "Stage 2 cancer", date, None);
        assert_eq!(record.severity(), Severity::Critical);
        assert_eq!(record.year(), 2024);
    }

    #[test]
    fn from_value_reads_all_fields() {
        let payload = json!({
            "record_id": 7,
            "user_id": 3,
            "doctor_id": 12,
            "diagnosis": "Migraine",
            "record_date": "2024-02-29",
            "file_path": "/scans/7.pdf",
        });
        let record = NewHealthRecord::from_value(&payload)
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.record_id(), 7);
        assert_eq!(record.user_id(), 3);
        assert_eq!(record.doctor_id(), 12);
        assert_eq!(record.severity(), Severity::Moderate);
        assert_eq!(record.file_path(), Some("/scans/7.pdf"));
    }

    #[test]
    fn file_path_is_optional() {
        let payload = json!({
            "record_id": 1,
            "user_id": 1,
            "doctor_id": 1,
            "diagnosis": "Cold",
            "record_date": "2024-01-01",
        });
        let new = NewHealthRecord::from_value(&payload).unwrap();
        assert!(new.file_path.is_none());
    }

    #[test]
    fn missing_user_id_named_in_error() {
        let payload = json!({
            "record_id": 1,
            "doctor_id": 1,
            "diagnosis": "Cold",
            "record_date": "2024-01-01",
        });
        assert_eq!(
            NewHealthRecord::from_value(&payload).unwrap_err(),
            ModelError::MissingField { field: "user_id" }
        );
    }

    #[test]
    fn bad_date_fails_into_record() {
        let new = NewHealthRecord {
            record_id: 1,
            user_id: 1,
            doctor_id: 1,
            diagnosis: "Cold".into(),
            record_date: "01/02/2024".into(),
            file_path: None,
        };
        match new.into_record().unwrap_err() {
            ModelError::InvalidTimestamp { field, .. } => assert_eq!(field, "record_date"),
            other => panic!("Expected InvalidTimestamp, got: {other}"),
        }
    }
}
