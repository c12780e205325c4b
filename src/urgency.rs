//! Treatment urgency queue.
//!
//! Pending follow-ups ordered by `(priority, follow_up_date, treatment_id)`,
//! where priority is days until due plus a severity offset. Lower sorts
//! first. The overdue set is fixed at insertion: a treatment that was not
//! yet due when added is never flagged later.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{floor_days, Severity, TreatmentId};

/// Days added to the priority of a tier. CRITICAL gets none.
pub fn severity_offset(severity: Severity) -> i64 {
    match severity {
        Severity::Critical => 0,
        Severity::Moderate => 10,
        Severity::Mild => 20,
    }
}

/// Priority of a follow-up as of `now`. Negative days for past-due dates.
pub fn priority(follow_up_date: NaiveDateTime, severity: Severity, now: NaiveDateTime) -> i64 {
    floor_days(follow_up_date - now) + severity_offset(severity)
}

/// One queued follow-up. Field order is the sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct UrgencyEntry {
    pub priority: i64,
    pub follow_up_date: NaiveDateTime,
    pub treatment_id: TreatmentId,
}

#[derive(Debug, Default)]
pub struct TreatmentQueue {
    ordering: BTreeSet<UrgencyEntry>,
    entries: HashMap<TreatmentId, UrgencyEntry>,
    overdue: HashSet<TreatmentId>,
}

impl TreatmentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a follow-up, replacing any entry already held for the id.
    pub fn add(
        &mut self,
        treatment_id: TreatmentId,
        follow_up_date: NaiveDateTime,
        severity: Severity,
        now: NaiveDateTime,
    ) -> UrgencyEntry {
        self.remove(treatment_id);

        let entry = UrgencyEntry {
            priority: priority(follow_up_date, severity, now),
            follow_up_date,
            treatment_id,
        };
        if follow_up_date < now {
            self.overdue.insert(treatment_id);
        }

        tracing::debug!(
            treatment_id,
            priority = entry.priority,
            %severity,
            overdue = follow_up_date < now,
            "Queued treatment follow-up"
        );
        self.ordering.insert(entry.clone());
        self.entries.insert(treatment_id, entry.clone());
        entry
    }

    /// Drop a treatment from the ordering and the overdue set.
    pub fn remove(&mut self, treatment_id: TreatmentId) -> bool {
        self.overdue.remove(&treatment_id);
        match self.entries.remove(&treatment_id) {
            Some(entry) => {
                self.ordering.remove(&entry);
                true
            }
            None => false,
        }
    }

    /// Ids of the `count` most urgent treatments. Leaves the queue intact.
    pub fn next_urgent(&self, count: usize) -> Vec<TreatmentId> {
        self.ordering
            .iter()
            .take(count)
            .map(|entry| entry.treatment_id)
            .collect()
    }

    /// Treatments that were already past due when queued. Returns a copy.
    pub fn overdue(&self) -> HashSet<TreatmentId> {
        self.overdue.clone()
    }

    pub fn entry(&self, treatment_id: TreatmentId) -> Option<&UrgencyEntry> {
        self.entries.get(&treatment_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
