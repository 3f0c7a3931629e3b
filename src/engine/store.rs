//! Adherence engine
//!
//! Owns the medication and log collections for one session and keeps the
//! derived [`AdherenceStats`] current after every mutation.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::adherence::{compute_stats, is_taken_on, logs_on};
use super::clock::Clock;
use crate::models::{
    AdherenceStats, Medication, MedicationCreate, MedicationLog, MedicationUpdate, ValidationError,
};

/// Result of deleting a medication
#[derive(Debug, Clone)]
pub struct DeletedMedication {
    pub medication: Medication,
    pub removed_logs: usize,
}

pub struct AdherenceEngine {
    medications: Vec<Medication>,
    logs: Vec<MedicationLog>,
    stats: AdherenceStats,
    clock: Arc<dyn Clock>,
}

impl AdherenceEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(Vec::new(), Vec::new(), clock)
    }

    /// Rebuild an engine from previously stored collections
    pub fn from_parts(
        medications: Vec<Medication>,
        logs: Vec<MedicationLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut engine = Self {
            medications,
            logs,
            stats: AdherenceStats::default(),
            clock,
        };
        engine.refresh_stats();
        engine
    }

    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    pub fn logs(&self) -> &[MedicationLog] {
        &self.logs
    }

    /// Stats as of the last mutation or refresh
    pub fn stats(&self) -> &AdherenceStats {
        &self.stats
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn medication(&self, id: &str) -> Option<&Medication> {
        self.medications.iter().find(|med| med.id == id)
    }

    /// Recompute stats against the clock's current day
    pub fn refresh_stats(&mut self) -> &AdherenceStats {
        self.stats = compute_stats(&self.medications, &self.logs, self.clock.today());
        &self.stats
    }

    /// Append a new medication with a fresh id and creation timestamp
    pub fn add_medication(&mut self, data: MedicationCreate) -> Result<&Medication, ValidationError> {
        let medication = self.build_medication(data)?;
        Ok(self.insert_medication(medication))
    }

    /// Validate `data` and build the medication `add_medication` would store,
    /// without storing it
    pub fn build_medication(&self, data: MedicationCreate) -> Result<Medication, ValidationError> {
        if let Err(e) = data.validate() {
            warn!(name = %data.name, error = %e, "Rejected medication");
            return Err(e);
        }

        Ok(Medication {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            dosage: data.dosage,
            frequency: data.frequency,
            times: data.times,
            color: data.color,
            notes: data.notes,
            created_at: self.clock.now(),
        })
    }

    /// Append a medication built by [`Self::build_medication`]
    pub fn insert_medication(&mut self, medication: Medication) -> &Medication {
        info!(id = %medication.id, name = %medication.name, "Added medication");
        self.medications.push(medication);
        self.refresh_stats();
        &self.medications[self.medications.len() - 1]
    }

    /// Merge `update` into the matching medication.
    ///
    /// Unknown ids are a no-op (`Ok(None)`). Logs keep the values copied when
    /// they were recorded.
    pub fn update_medication(
        &mut self,
        id: &str,
        update: &MedicationUpdate,
    ) -> Result<Option<&Medication>, ValidationError> {
        match self.merged_medication(id, update)? {
            Some(merged) => Ok(self.replace_medication(merged)),
            None => Ok(None),
        }
    }

    /// The validated result of applying `update`, leaving the engine untouched
    pub fn merged_medication(
        &self,
        id: &str,
        update: &MedicationUpdate,
    ) -> Result<Option<Medication>, ValidationError> {
        let Some(current) = self.medication(id) else {
            debug!(id, "Update for unknown medication ignored");
            return Ok(None);
        };

        let mut merged = current.clone();
        merged.apply(update);
        if let Err(e) = merged.validate() {
            warn!(id, error = %e, "Rejected medication update");
            return Err(e);
        }
        Ok(Some(merged))
    }

    /// Swap in a medication with the same id; unknown ids are ignored
    pub fn replace_medication(&mut self, medication: Medication) -> Option<&Medication> {
        let idx = self.medications.iter().position(|med| med.id == medication.id)?;
        self.medications[idx] = medication;
        self.refresh_stats();
        Some(&self.medications[idx])
    }

    /// Remove a medication and every log that references it
    pub fn delete_medication(&mut self, id: &str) -> Option<DeletedMedication> {
        let Some(idx) = self.medications.iter().position(|med| med.id == id) else {
            debug!(id, "Delete for unknown medication ignored");
            return None;
        };

        let medication = self.medications.remove(idx);
        let before = self.logs.len();
        self.logs.retain(|log| log.medication_id != id);
        let removed_logs = before - self.logs.len();
        info!(id, removed_logs, "Deleted medication");

        self.refresh_stats();
        Some(DeletedMedication {
            medication,
            removed_logs,
        })
    }

    /// Record a dose of an existing medication as taken now.
    ///
    /// Repeated calls on the same day each add a log.
    pub fn mark_medication_taken(
        &mut self,
        medication_id: &str,
        photo_url: Option<String>,
        notes: Option<String>,
    ) -> Option<&MedicationLog> {
        let log = self.build_log(medication_id, photo_url, notes)?;
        Some(self.insert_log(log))
    }

    /// The log `mark_medication_taken` would record, without recording it
    pub fn build_log(
        &self,
        medication_id: &str,
        photo_url: Option<String>,
        notes: Option<String>,
    ) -> Option<MedicationLog> {
        let Some(medication) = self.medication(medication_id) else {
            debug!(medication_id, "Mark taken for unknown medication ignored");
            return None;
        };

        Some(MedicationLog::for_medication(
            Uuid::new_v4().to_string(),
            medication,
            self.clock.now(),
            photo_url,
            notes,
        ))
    }

    /// Append a log built by [`Self::build_log`]
    pub fn insert_log(&mut self, log: MedicationLog) -> &MedicationLog {
        info!(id = %log.id, medication_id = %log.medication_id, "Marked medication taken");
        self.logs.push(log);
        self.refresh_stats();
        &self.logs[self.logs.len() - 1]
    }

    pub fn log(&self, log_id: &str) -> Option<&MedicationLog> {
        self.logs.iter().find(|log| log.id == log_id)
    }

    /// Remove a single log entry
    pub fn remove_log(&mut self, log_id: &str) -> Option<MedicationLog> {
        let Some(idx) = self.logs.iter().position(|log| log.id == log_id) else {
            debug!(log_id, "Remove for unknown log ignored");
            return None;
        };

        let removed = self.logs.remove(idx);
        info!(log_id, medication_id = %removed.medication_id, "Removed medication log");
        self.refresh_stats();
        Some(removed)
    }

    /// Logs taken on `date` (local calendar day), in insertion order
    pub fn logs_for_date(&self, date: NaiveDate) -> Vec<&MedicationLog> {
        logs_on(&self.logs, date).collect()
    }

    /// True once any dose of the medication has been logged today
    pub fn is_medication_taken_today(&self, medication_id: &str) -> bool {
        is_taken_on(&self.logs, medication_id, self.clock.today())
    }
}
