use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    as_object, optional_str, parse_timestamp, require_id, ModelError, RecordId, TreatmentId,
};

/// Treatment payload forwarded after a durable insert.
///
/// `diagnosis` is the text of the referenced record, when the caller has
/// resolved it. Without it the engine falls back to the record it indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTreatment {
    pub treatment_id: TreatmentId,
    pub record_id: RecordId,
    #[serde(default)]
    pub follow_up_date: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
}

impl NewTreatment {
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        let map = as_object(value, "treatment")?;
        Ok(Self {
            treatment_id: require_id(map, "treatment_id")?,
            record_id: require_id(map, "record_id")?,
            follow_up_date: optional_str(map, "follow_up_date")?.map(str::to_string),
            diagnosis: optional_str(map, "diagnosis")?.map(str::to_string),
        })
    }

    /// Parsed follow-up date. A blank string means no follow-up.
    pub fn follow_up(&self) -> Result<Option<NaiveDateTime>, ModelError> {
        match self.follow_up_date.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_timestamp("follow_up_date", raw).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn follow_up_parsed() {
        let t = NewTreatment::from_value(&json!({
            "treatment_id": 1,
            "record_id": 2,
            "follow_up_date": "2024-03-01",
        }))
        .unwrap();
        assert_eq!(
            t.follow_up().unwrap().map(|d| d.to_string()),
            Some("2024-03-01 00:00:00".to_string())
        );
    }

    #[test]
    fn blank_follow_up_is_none() {
        let t = NewTreatment::from_value(&json!({
            "treatment_id": 1,
            "record_id": 2,
            "follow_up_date": "",
        }))
        .unwrap();
        assert_eq!(t.follow_up().unwrap(), None);
    }

    #[test]
    fn missing_treatment_id_named() {
        let err = NewTreatment::from_value(&json!({"record_id": 2})).unwrap_err();
        assert_eq!(err, ModelError::MissingField { field: "treatment_id" });
    }

    #[test]
    fn malformed_follow_up_errors() {
        let t = NewTreatment {
            treatment_id: 1,
            record_id: 2,
            follow_up_date: Some("soon".into()),
            diagnosis: None,
        };
        assert!(t.follow_up().is_err());
    }
}
