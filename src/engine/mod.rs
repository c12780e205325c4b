//! Health metrics aggregation engine.
//!
//! Sits beside the record store and answers analytical reads (per-user
//! summaries, system statistics, urgent treatments, doctor workload)
//! from in-memory indices fed by the request layer after each durable
//! write. Explicitly constructed and shared by reference (`Arc`); there
//! is no process-wide instance.
//!
//! Each shared structure has its own lock. Methods that need several take
//! them in a fixed order: timelines, treatments, workload, cache. Every
//! `add_*` validates and parses its input before taking any lock, so a
//! rejected call leaves every index untouched.

mod clock;
mod error;
mod types;

pub use clock::*;
pub use error::*;
pub use types::*;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::cache::{artifact_key, CacheSlot, RecencyCache};
use crate::config::EngineConfig;
use crate::models::{
    CachedArtifact, Doctor, DoctorId, HealthRecord, NewHealthRecord, NewTreatment, RecordId,
    Severity, TreatmentId, UserId,
};
use crate::severity::classify;
use crate::timeline::PatientTimeline;
use crate::urgency::TreatmentQueue;
use crate::workload::DoctorAnalytics;

// ═══════════════════════════════════════════════════════════
// Guarded state
// ═══════════════════════════════════════════════════════════

#[derive(Default)]
struct TimelineStore {
    by_user: HashMap<UserId, PatientTimeline>,
    /// Owner and tier of every indexed record.
    records: HashMap<RecordId, (UserId, Severity)>,
}

#[derive(Default)]
struct TreatmentStore {
    queue: TreatmentQueue,
    by_record: HashMap<RecordId, Vec<TreatmentId>>,
    record_of: HashMap<TreatmentId, RecordId>,
}

impl TreatmentStore {
    fn insert(
        &mut self,
        treatment_id: TreatmentId,
        record_id: RecordId,
        follow_up_date: NaiveDateTime,
        severity: Severity,
        now: NaiveDateTime,
    ) {
        self.detach(treatment_id);
        self.queue.add(treatment_id, follow_up_date, severity, now);
        self.by_record.entry(record_id).or_default().push(treatment_id);
        self.record_of.insert(treatment_id, record_id);
    }

    fn detach(&mut self, treatment_id: TreatmentId) -> bool {
        let removed = self.queue.remove(treatment_id);
        if let Some(record_id) = self.record_of.remove(&treatment_id) {
            if let Some(ids) = self.by_record.get_mut(&record_id) {
                ids.retain(|&id| id != treatment_id);
                if ids.is_empty() {
                    self.by_record.remove(&record_id);
                }
            }
        }
        removed
    }

    /// Drop every treatment attached to a record. Returns how many.
    fn detach_record(&mut self, record_id: RecordId) -> usize {
        let ids = self.by_record.remove(&record_id).unwrap_or_default();
        for id in &ids {
            self.queue.remove(*id);
            self.record_of.remove(id);
        }
        ids.len()
    }
}

// ═══════════════════════════════════════════════════════════
// HealthMetricsEngine
// ═══════════════════════════════════════════════════════════

pub struct HealthMetricsEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    timelines: RwLock<TimelineStore>,
    treatments: RwLock<TreatmentStore>,
    workload: RwLock<DoctorAnalytics>,
    /// Reads promote, so even lookups take the mutex.
    cache: Mutex<RecencyCache<UserHealthSummary>>,
}

impl HealthMetricsEngine {
    /// Create an engine reading the system clock.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        tracing::info!(
            cache_capacity = config.cache_capacity,
            recent_activity_days = config.recent_activity_days,
            "Health metrics engine ready"
        );
        Self {
            cache: Mutex::new(RecencyCache::new(config.cache_capacity)),
            config,
            clock,
            timelines: RwLock::new(TimelineStore::default()),
            treatments: RwLock::new(TreatmentStore::default()),
            workload: RwLock::new(DoctorAnalytics::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Writes ───────────────────────────────────────────

    /// Index a newly persisted health record and invalidate the owner's
    /// cached summary.
    pub fn add_health_record(&self, new: NewHealthRecord) -> Result<(), EngineError> {
        let record = new.into_record()?;
        let (record_id, user_id, severity) =
            (record.record_id(), record.user_id(), record.severity());

        let mut timelines = self.write_timelines()?;
        if timelines.records.contains_key(&record_id) {
            tracing::warn!(record_id, "Rejected duplicate health record");
            return Err(EngineError::DuplicateRecord(record_id));
        }
        let mut cache = self.lock_cache()?;

        timelines.by_user.entry(user_id).or_default().add(record);
        timelines.records.insert(record_id, (user_id, severity));
        cache.invalidate(&artifact_key(CachedArtifact::UserSummary, user_id));

        tracing::debug!(record_id, user_id, %severity, "Indexed health record");
        Ok(())
    }

    /// `add_health_record` for the JSON map the request layer forwards.
    pub fn add_health_record_json(&self, payload: &Value) -> Result<(), EngineError> {
        let new = NewHealthRecord::from_value(payload).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected health record payload");
        })?;
        self.add_health_record(new)
    }

    /// Queue a treatment follow-up.
    ///
    /// Severity comes from the supplied diagnosis, or else from the indexed
    /// record. Returns `false` when there is no follow-up date to queue.
    pub fn add_treatment(&self, new: NewTreatment) -> Result<bool, EngineError> {
        let Some(follow_up_date) = new.follow_up()? else {
            return Ok(false);
        };

        // Held across the insert so record removal cannot interleave.
        let timelines = self.read_timelines()?;
        let severity = match new.diagnosis.as_deref() {
            Some(diagnosis) => classify(diagnosis),
            None => timelines
                .records
                .get(&new.record_id)
                .map(|&(_, severity)| severity)
                .ok_or(EngineError::UnknownRecord(new.record_id))?,
        };

        let now = self.clock.now();
        self.write_treatments()?.insert(
            new.treatment_id,
            new.record_id,
            follow_up_date,
            severity,
            now,
        );
        drop(timelines);
        Ok(true)
    }

    pub fn add_treatment_json(&self, payload: &Value) -> Result<bool, EngineError> {
        let new = NewTreatment::from_value(payload).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected treatment payload");
        })?;
        self.add_treatment(new)
    }

    /// Register (or re-register) a doctor for workload ranking.
    pub fn add_doctor(&self, doctor: Doctor) -> Result<(), EngineError> {
        self.write_workload()?.register(doctor);
        Ok(())
    }

    pub fn add_doctor_json(&self, payload: &Value) -> Result<(), EngineError> {
        let doctor = Doctor::from_value(payload).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected doctor payload");
        })?;
        self.add_doctor(doctor)
    }

    /// Drop a deleted record from its timeline along with the treatments
    /// queued against it. Returns false for a record that was never indexed;
    /// treatments queued against it with their own diagnosis are still dropped.
    pub fn remove_health_record(&self, record_id: RecordId) -> Result<bool, EngineError> {
        let mut timelines = self.write_timelines()?;
        let mut treatments = self.write_treatments()?;
        let Some(&(user_id, _)) = timelines.records.get(&record_id) else {
            let dropped = treatments.detach_record(record_id);
            if dropped > 0 {
                tracing::debug!(
                    record_id,
                    dropped_treatments = dropped,
                    "Dropped treatments of unindexed record"
                );
            }
            return Ok(false);
        };
        let mut cache = self.lock_cache()?;

        timelines.records.remove(&record_id);
        let now_empty = match timelines.by_user.get_mut(&user_id) {
            Some(timeline) => {
                timeline.remove(record_id);
                timeline.is_empty()
            }
            None => false,
        };
        if now_empty {
            timelines.by_user.remove(&user_id);
        }
        let dropped = treatments.detach_record(record_id);
        cache.invalidate(&artifact_key(CachedArtifact::UserSummary, user_id));

        tracing::debug!(
            record_id,
            user_id,
            dropped_treatments = dropped,
            "Removed health record"
        );
        Ok(true)
    }

    pub fn remove_treatment(&self, treatment_id: TreatmentId) -> Result<bool, EngineError> {
        Ok(self.write_treatments()?.detach(treatment_id))
    }

    pub fn remove_doctor(&self, doctor_id: DoctorId) -> Result<bool, EngineError> {
        Ok(self.write_workload()?.unregister(doctor_id).is_some())
    }

    // ── Summaries ────────────────────────────────────────

    /// Health summary of one user, served from the cache when fresh.
    pub fn get_user_health_summary(
        &self,
        user_id: UserId,
    ) -> Result<UserSummaryResponse, EngineError> {
        let key = artifact_key(CachedArtifact::UserSummary, user_id);
        let timelines = self.read_timelines()?;
        let mut cache = self.lock_cache()?;

        if let Some(summary) = cache.get(&key).and_then(CacheSlot::value) {
            tracing::debug!(user_id, "Health summary served from cache");
            return Ok(UserSummaryResponse::Summary(summary.clone()));
        }

        let Some(timeline) = timelines.by_user.get(&user_id) else {
            return Ok(UserSummaryResponse::no_data());
        };

        let summary = self.summarize(timeline);
        cache.put(key, summary.clone());
        Ok(UserSummaryResponse::Summary(summary))
    }

    /// System-wide statistics, computed fresh on every call.
    pub fn get_system_analytics(&self) -> Result<SystemAnalytics, EngineError> {
        let timelines = self.read_timelines()?;

        let total_users = timelines.by_user.len();
        let mut total_records = 0;
        let mut severity_distribution = BTreeMap::new();
        for timeline in timelines.by_user.values() {
            total_records += timeline.total_records();
            for (severity, count) in timeline.severity_counts() {
                *severity_distribution.entry(severity).or_insert(0) += count;
            }
        }

        let avg_records_per_user = if total_users > 0 {
            total_records as f64 / total_users as f64
        } else {
            0.0
        };

        Ok(SystemAnalytics {
            total_users,
            total_records,
            severity_distribution,
            avg_records_per_user,
        })
    }

    fn summarize(&self, timeline: &PatientTimeline) -> UserHealthSummary {
        UserHealthSummary {
            total_records: timeline.total_records(),
            critical_conditions: timeline.critical_records().len(),
            most_visited_doctors: timeline.top_doctors(self.config.summary_top_doctors),
            common_conditions: timeline.top_conditions(self.config.summary_top_conditions),
            recent_activity: timeline
                .recent_count(self.clock.now(), self.config.recent_activity_days),
        }
    }

    // ── Timeline reads ───────────────────────────────────

    /// A user's records for one year, most recent first.
    pub fn records_for_year(
        &self,
        user_id: UserId,
        year: i32,
    ) -> Result<Vec<HealthRecord>, EngineError> {
        Ok(self
            .read_timelines()?
            .by_user
            .get(&user_id)
            .map(|t| t.records_for_year(year).to_vec())
            .unwrap_or_default())
    }

    pub fn critical_records(&self, user_id: UserId) -> Result<Vec<HealthRecord>, EngineError> {
        Ok(self
            .read_timelines()?
            .by_user
            .get(&user_id)
            .map(|t| t.critical_records().to_vec())
            .unwrap_or_default())
    }

    // ── Treatment reads ──────────────────────────────────

    pub fn next_urgent(&self, count: usize) -> Result<Vec<TreatmentId>, EngineError> {
        Ok(self.read_treatments()?.queue.next_urgent(count))
    }

    pub fn overdue(&self) -> Result<HashSet<TreatmentId>, EngineError> {
        Ok(self.read_treatments()?.queue.overdue())
    }

    /// Most urgent treatments plus the overdue set, in one consistent read.
    pub fn urgent_treatments(&self) -> Result<UrgentTreatments, EngineError> {
        let treatments = self.read_treatments()?;
        let urgent = treatments.queue.next_urgent(self.config.urgent_listing_limit);
        let mut overdue: Vec<_> = treatments.queue.overdue().into_iter().collect();
        overdue.sort_unstable();

        Ok(UrgentTreatments {
            total_urgent: urgent.len(),
            total_overdue: overdue.len(),
            urgent,
            overdue,
        })
    }

    // ── Doctor reads ─────────────────────────────────────

    pub fn doctors_in_specialization(
        &self,
        specialization: &str,
    ) -> Result<Vec<Doctor>, EngineError> {
        Ok(self
            .read_workload()?
            .doctors_in_specialization(specialization)
            .to_vec())
    }

    pub fn least_busy(&self, count: usize) -> Result<Vec<DoctorId>, EngineError> {
        Ok(self.read_workload()?.least_busy(count))
    }

    /// `least_busy` with the configured default count.
    pub fn least_busy_doctors(&self) -> Result<Vec<DoctorId>, EngineError> {
        self.least_busy(self.config.least_busy_default)
    }

    /// Compute and store a doctor's efficiency score.
    pub fn score_doctor(
        &self,
        doctor_id: DoctorId,
        avg_severity: f64,
        patient_count: u32,
    ) -> Result<f64, EngineError> {
        Ok(self
            .write_workload()?
            .score(doctor_id, avg_severity, patient_count))
    }

    pub fn efficiency_score(&self, doctor_id: DoctorId) -> Result<Option<f64>, EngineError> {
        Ok(self.read_workload()?.efficiency_score(doctor_id))
    }

    // ── Lock helpers ─────────────────────────────────────

    fn read_timelines(&self) -> Result<RwLockReadGuard<'_, TimelineStore>, EngineError> {
        self.timelines.read().map_err(|_| EngineError::LockPoisoned)
    }

    fn write_timelines(&self) -> Result<RwLockWriteGuard<'_, TimelineStore>, EngineError> {
        self.timelines.write().map_err(|_| EngineError::LockPoisoned)
    }

    fn read_treatments(&self) -> Result<RwLockReadGuard<'_, TreatmentStore>, EngineError> {
        self.treatments.read().map_err(|_| EngineError::LockPoisoned)
    }

    fn write_treatments(&self) -> Result<RwLockWriteGuard<'_, TreatmentStore>, EngineError> {
        self.treatments.write().map_err(|_| EngineError::LockPoisoned)
    }

    fn read_workload(&self) -> Result<RwLockReadGuard<'_, DoctorAnalytics>, EngineError> {
        self.workload.read().map_err(|_| EngineError::LockPoisoned)
    }

    fn write_workload(&self) -> Result<RwLockWriteGuard<'_, DoctorAnalytics>, EngineError> {
        self.workload.write().map_err(|_| EngineError::LockPoisoned)
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, RecencyCache<UserHealthSummary>>, EngineError> {
        self.cache.lock().map_err(|_| EngineError::LockPoisoned)
    }
}

impl Default for HealthMetricsEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
