//! Doctor workload analytics.
//!
//! Specialization index, a least-busy-first workload ranking, and
//! per-doctor efficiency scores. The ranking is an ordered set keyed by
//! `(patient_count, doctor_id)`, so reading the top of it never consumes it.

use std::collections::{BTreeSet, HashMap};

use crate::models::{Doctor, DoctorId};

/// Patient load that counts as a full workload in efficiency scoring.
const FULL_LOAD_PATIENTS: f64 = 50.0;

/// Upper bound on the load factor.
const MAX_LOAD_FACTOR: f64 = 2.0;

#[derive(Debug, Default)]
pub struct DoctorAnalytics {
    specialization_map: HashMap<String, Vec<Doctor>>,
    workload: BTreeSet<(u32, DoctorId)>,
    /// Ranking key and specialization of each registered doctor.
    registered: HashMap<DoctorId, (u32, String)>,
    efficiency_scores: HashMap<DoctorId, f64>,
}

impl DoctorAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a doctor with the patient count it carries.
    ///
    /// Re-registering an id replaces its ranking entry and moves it to the
    /// end of its (possibly new) specialization list.
    pub fn register(&mut self, doctor: Doctor) {
        if self.registered.contains_key(&doctor.doctor_id) {
            self.detach(doctor.doctor_id);
        }

        self.workload.insert((doctor.patient_count, doctor.doctor_id));
        self.registered.insert(
            doctor.doctor_id,
            (doctor.patient_count, doctor.specialization.clone()),
        );
        tracing::debug!(
            doctor_id = doctor.doctor_id,
            patient_count = doctor.patient_count,
            specialization = %doctor.specialization,
            "Registered doctor"
        );
        self.specialization_map
            .entry(doctor.specialization.clone())
            .or_default()
            .push(doctor);
    }

    /// Remove a doctor from the index and ranking. Keeps no score either.
    pub fn unregister(&mut self, doctor_id: DoctorId) -> Option<Doctor> {
        let removed = self.detach(doctor_id);
        self.efficiency_scores.remove(&doctor_id);
        removed
    }

    /// Doctors in a specialization, in registration order.
    pub fn doctors_in_specialization(&self, specialization: &str) -> &[Doctor] {
        self.specialization_map
            .get(specialization)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ids of the `count` least busy doctors. Ties go to the lower id.
    pub fn least_busy(&self, count: usize) -> Vec<DoctorId> {
        self.workload
            .iter()
            .take(count)
            .map(|&(_, doctor_id)| doctor_id)
            .collect()
    }

    /// Efficiency score: `avg_severity * 10` divided by a load factor of
    /// `min(patient_count / 50, 2.0)`. Zero patients score zero and nothing
    /// is stored.
    pub fn score(&mut self, doctor_id: DoctorId, avg_severity: f64, patient_count: u32) -> f64 {
        if patient_count == 0 {
            return 0.0;
        }

        let base_score = avg_severity * 10.0;
        let load_factor = (f64::from(patient_count) / FULL_LOAD_PATIENTS).min(MAX_LOAD_FACTOR);
        let efficiency = if load_factor > 0.0 {
            base_score / load_factor
        } else {
            base_score
        };

        self.efficiency_scores.insert(doctor_id, efficiency);
        efficiency
    }

    /// Last score computed for a doctor.
    pub fn efficiency_score(&self, doctor_id: DoctorId) -> Option<f64> {
        self.efficiency_scores.get(&doctor_id).copied()
    }

    pub fn is_registered(&self, doctor_id: DoctorId) -> bool {
        self.registered.contains_key(&doctor_id)
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    fn detach(&mut self, doctor_id: DoctorId) -> Option<Doctor> {
        let (patient_count, specialization) = self.registered.remove(&doctor_id)?;
        self.workload.remove(&(patient_count, doctor_id));

        let list = self.specialization_map.get_mut(&specialization)?;
        let pos = list.iter().position(|d| d.doctor_id == doctor_id)?;
        let doctor = list.remove(pos);
        if list.is_empty() {
            self.specialization_map.remove(&specialization);
        }
        Some(doctor)
    }
}
