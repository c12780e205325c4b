//! Keyword-driven severity classification of diagnosis text.
//!
//! Matching is a case-insensitive substring test. A CRITICAL keyword always
//! wins over a MODERATE one; anything unmatched is MILD.

use crate::models::Severity;

/// Substrings that mark a diagnosis as CRITICAL.
pub const CRITICAL_KEYWORDS: [&str; 6] = [
    "hypertension",
    "diabetes",
    "heart",
    "cancer",
    "stroke",
    "emergency",
];

/// Substrings that mark a diagnosis as MODERATE.
pub const MODERATE_KEYWORDS: [&str; 5] =
    ["asthma", "allergies", "migraine", "arthritis", "chronic"];

/// Classify a diagnosis into a severity tier. Total and pure.
pub fn classify(diagnosis: &str) -> Severity {
    let lowered = diagnosis.to_lowercase();

    if CRITICAL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Severity::Critical
    } else if MODERATE_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Severity::Moderate
    } else {
        Severity::Mild
    }
}
