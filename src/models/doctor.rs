use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    as_object, optional_f64, optional_str, optional_u32, require_id, require_str, DoctorId,
    ModelError,
};

/// A registered doctor.
///
/// `patient_count` and `avg_severity_score` are supplied by the caller and
/// never recomputed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub doctor_id: DoctorId,
    pub name: String,
    pub specialization: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub patient_count: u32,
    #[serde(default)]
    pub avg_severity_score: f64,
}

impl Doctor {
    pub fn new(
        doctor_id: DoctorId,
        name: impl Into<String>,
        specialization: impl Into<String>,
    ) -> Self {
        Self {
            doctor_id,
            name: name.into(),
            specialization: specialization.into(),
            contact_number: String::new(),
            email: String::new(),
            patient_count: 0,
            avg_severity_score: 0.0,
        }
    }

    pub fn with_patient_count(mut self, patient_count: u32) -> Self {
        self.patient_count = patient_count;
        self
    }

    /// Read a registration payload out of a JSON map.
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        let map = as_object(value, "doctor")?;
        Ok(Self {
            doctor_id: require_id(map, "doctor_id")?,
            name: require_str(map, "name")?.to_string(),
            specialization: require_str(map, "specialization")?.to_string(),
            contact_number: optional_str(map, "contact_number")?.unwrap_or_default().to_string(),
            email: optional_str(map, "email")?.unwrap_or_default().to_string(),
            patient_count: optional_u32(map, "patient_count")?.unwrap_or(0),
            avg_severity_score: optional_f64(map, "avg_severity_score")?.unwrap_or(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registration_defaults_descriptive_fields() {
        let doctor = Doctor::from_value(&json!({
            "doctor_id": 4,
            "name": "Dr. Osei",
            "specialization": "Cardiology",
        }))
        .unwrap();
        assert_eq!(doctor.patient_count, 0);
        assert_eq!(doctor.avg_severity_score, 0.0);
        assert!(doctor.email.is_empty());
        assert!(doctor.contact_number.is_empty());
    }

    #[test]
    fn missing_doctor_id_is_rejected() {
        let err = Doctor::from_value(&json!({"name": "Dr. Osei", "specialization": "Cardiology"}))
            .unwrap_err();
        assert_eq!(err, ModelError::MissingField { field: "doctor_id" });
    }

    #[test]
    fn patient_count_read_when_supplied() {
        let doctor = Doctor::from_value(&json!({
            "doctor_id": 4,
            "name": "Dr. Osei",
            "specialization": "Cardiology",
            "patient_count": 42,
            "avg_severity_score": 1.5,
        }))
        .unwrap();
        assert_eq!(doctor.patient_count, 42);
        assert_eq!(doctor.avg_severity_score, 1.5);
    }

    #[test]
    fn builder_sets_patient_count() {
        let doctor = Doctor::new(1, "Dr. Lin", "Neurology").with_patient_count(7);
        assert_eq!(doctor.patient_count, 7);
        assert_eq!(doctor.specialization, "Neurology");
    }
}
