//! Per-user timeline index.
//!
//! Holds every record of one user four ways: by calendar year (most recent
//! first), by severity tier, and as visit/diagnosis frequency counts. A
//! record's year and tier are fixed when it is added and never revisited.

mod counter;

pub use counter::FrequencyCounter;

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::models::{floor_days, DoctorId, HealthRecord, RecordId, Severity};

#[derive(Debug, Clone, Default)]
pub struct PatientTimeline {
    records_by_year: BTreeMap<i32, Vec<HealthRecord>>,
    severity_index: BTreeMap<Severity, Vec<HealthRecord>>,
    doctor_visits: FrequencyCounter<DoctorId>,
    condition_frequency: FrequencyCounter<String>,
    total: usize,
}

impl PatientTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a record under its year, tier, doctor and diagnosis.
    ///
    /// Year buckets stay sorted most-recent-first; a record sharing a
    /// timestamp with existing ones lands after them.
    pub fn add(&mut self, record: HealthRecord) {
        let bucket = self.records_by_year.entry(record.year()).or_default();
        let at = bucket.partition_point(|r| r.record_date() >= record.record_date());
        bucket.insert(at, record.clone());

        self.doctor_visits.increment(&record.doctor_id());
        self.condition_frequency
            .increment(&record.diagnosis().to_string());
        self.severity_index
            .entry(record.severity())
            .or_default()
            .push(record);
        self.total += 1;
    }

    /// Remove a record from every index. Returns the removed record.
    pub fn remove(&mut self, record_id: RecordId) -> Option<HealthRecord> {
        let (year, pos) = self.records_by_year.iter().find_map(|(year, bucket)| {
            bucket
                .iter()
                .position(|r| r.record_id() == record_id)
                .map(|pos| (*year, pos))
        })?;

        let bucket = self.records_by_year.get_mut(&year)?;
        let record = bucket.remove(pos);
        if bucket.is_empty() {
            self.records_by_year.remove(&year);
        }

        if let Some(tier) = self.severity_index.get_mut(&record.severity()) {
            if let Some(pos) = tier.iter().position(|r| r.record_id() == record_id) {
                tier.remove(pos);
            }
            if tier.is_empty() {
                self.severity_index.remove(&record.severity());
            }
        }

        self.doctor_visits.decrement(&record.doctor_id());
        self.condition_frequency
            .decrement(&record.diagnosis().to_string());
        self.total -= 1;
        Some(record)
    }

    // ── Queries ──────────────────────────────────────────

    /// Records dated in `year`, most recent first.
    pub fn records_for_year(&self, year: i32) -> &[HealthRecord] {
        self.records_by_year
            .get(&year)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records in one severity tier, in insertion order.
    pub fn records_with_severity(&self, severity: Severity) -> &[HealthRecord] {
        self.severity_index
            .get(&severity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn critical_records(&self) -> &[HealthRecord] {
        self.records_with_severity(Severity::Critical)
    }

    /// Most visited doctors as `(doctor_id, visits)`.
    pub fn top_doctors(&self, limit: usize) -> Vec<(DoctorId, usize)> {
        self.doctor_visits.most_common(limit)
    }

    /// Most frequent diagnoses as `(diagnosis, count)`.
    pub fn top_conditions(&self, limit: usize) -> Vec<(String, usize)> {
        self.condition_frequency.most_common(limit)
    }

    /// Per-tier record counts. Tiers with no records are absent.
    pub fn severity_counts(&self) -> impl Iterator<Item = (Severity, usize)> + '_ {
        self.severity_index
            .iter()
            .map(|(severity, records)| (*severity, records.len()))
    }

    /// Records no more than `window_days` whole days old as of `now`.
    /// Future-dated records count as recent.
    pub fn recent_count(&self, now: NaiveDateTime, window_days: i64) -> usize {
        self.records_by_year
            .values()
            .flatten()
            .filter(|r| floor_days(now - r.record_date()) <= window_days)
            .count()
    }

    pub fn total_records(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Years that have at least one record, newest first.
    pub fn years(&self) -> Vec<i32> {
        self.records_by_year.keys().rev().copied().collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
