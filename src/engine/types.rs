use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{DoctorId, Severity, TreatmentId};

/// Message carried by the "no data" summary response.
pub const NO_RECORDS_MESSAGE: &str = "No health records found";

/// Health summary of one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserHealthSummary {
    pub total_records: usize,
    /// Number of CRITICAL records.
    pub critical_conditions: usize,
    /// `(doctor_id, visits)`, most visited first.
    pub most_visited_doctors: Vec<(DoctorId, usize)>,
    /// `(diagnosis, count)`, most frequent first.
    pub common_conditions: Vec<(String, usize)>,
    /// Records inside the recent-activity window.
    pub recent_activity: usize,
}

/// Summary lookup result. Serializes to the summary itself, or to
/// `{"error": "No health records found"}` for an unknown user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserSummaryResponse {
    Summary(UserHealthSummary),
    NoData { error: &'static str },
}

impl UserSummaryResponse {
    pub fn no_data() -> Self {
        Self::NoData {
            error: NO_RECORDS_MESSAGE,
        }
    }

    pub fn summary(&self) -> Option<&UserHealthSummary> {
        match self {
            Self::Summary(summary) => Some(summary),
            Self::NoData { .. } => None,
        }
    }
}

/// System-wide statistics across all user timelines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemAnalytics {
    pub total_users: usize,
    pub total_records: usize,
    /// Tiers with no records are absent.
    pub severity_distribution: BTreeMap<Severity, usize>,
    pub avg_records_per_user: f64,
}

/// Combined urgent-treatment listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrgentTreatments {
    pub urgent: Vec<TreatmentId>,
    /// Ascending.
    pub overdue: Vec<TreatmentId>,
    pub total_urgent: usize,
    pub total_overdue: usize,
}
