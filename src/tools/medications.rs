//! Medication MCP Tools
//!
//! Add, inspect, edit, and delete tracked medications.

use serde::Serialize;

use crate::models::{AdherenceStats, Medication, MedicationCreate, MedicationUpdate};
use crate::session::Session;

/// Response for add_medication
#[derive(Debug, Serialize)]
pub struct AddMedicationResponse {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub times: Vec<String>,
    pub created_at: String,
    pub stats: AdherenceStats,
}

/// Medication summary for listing
#[derive(Debug, Serialize)]
pub struct MedicationSummary {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub times: Vec<String>,
    pub color: String,
    pub taken_today: bool,
}

/// Full medication detail
#[derive(Debug, Serialize)]
pub struct MedicationDetail {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub frequency_display: String,
    pub doses_per_day: usize,
    pub times: Vec<String>,
    pub color: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub taken_today: bool,
    pub log_count: usize,
}

/// Response for list_medications
#[derive(Debug, Serialize)]
pub struct ListMedicationsResponse {
    pub medications: Vec<MedicationSummary>,
    pub total: usize,
    pub taken_today: usize,
}

/// Response for update_medication
#[derive(Debug, Serialize)]
pub struct UpdateMedicationResponse {
    pub found: bool,
    pub medication: Option<MedicationDetail>,
    pub note: Option<String>,
}

/// Response for delete_medication
#[derive(Debug, Serialize)]
pub struct DeleteMedicationResponse {
    pub found: bool,
    pub deleted_id: String,
    pub removed_logs: usize,
    pub stats: AdherenceStats,
}

fn summary(session: &Session, med: &Medication) -> MedicationSummary {
    MedicationSummary {
        id: med.id.clone(),
        name: med.name.clone(),
        dosage: med.dosage.clone(),
        frequency: med.frequency.as_str().to_string(),
        times: med.times.clone(),
        color: med.color.clone(),
        taken_today: session.engine().is_medication_taken_today(&med.id),
    }
}

fn detail(session: &Session, med: &Medication) -> MedicationDetail {
    let engine = session.engine();
    MedicationDetail {
        id: med.id.clone(),
        name: med.name.clone(),
        dosage: med.dosage.clone(),
        frequency: med.frequency.as_str().to_string(),
        frequency_display: med.frequency.display_name().to_string(),
        doses_per_day: med.frequency.dose_count(),
        times: med.times.clone(),
        color: med.color.clone(),
        notes: med.notes.clone(),
        created_at: med.created_at.to_rfc3339(),
        taken_today: engine.is_medication_taken_today(&med.id),
        log_count: engine
            .logs()
            .iter()
            .filter(|log| log.medication_id == med.id)
            .count(),
    }
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Add a new medication
pub fn add_medication(
    session: &mut Session,
    data: MedicationCreate,
) -> Result<AddMedicationResponse, String> {
    let med = session.add_medication(data).map_err(|e| e.to_string())?;

    Ok(AddMedicationResponse {
        id: med.id,
        name: med.name,
        dosage: med.dosage,
        frequency: med.frequency.as_str().to_string(),
        times: med.times,
        created_at: med.created_at.to_rfc3339(),
        stats: *session.engine().stats(),
    })
}

/// Get a medication by ID
pub fn get_medication(session: &Session, id: &str) -> Option<MedicationDetail> {
    session
        .engine()
        .medication(id)
        .map(|med| detail(session, med))
}

/// List medications in the order they were added
pub fn list_medications(session: &mut Session) -> ListMedicationsResponse {
    let stats = session.refresh_stats();
    let medications: Vec<MedicationSummary> = session
        .engine()
        .medications()
        .iter()
        .map(|med| summary(session, med))
        .collect();

    ListMedicationsResponse {
        total: medications.len(),
        medications,
        taken_today: stats.taken_today,
    }
}

/// Update a medication; unknown ids report `found: false`
pub fn update_medication(
    session: &mut Session,
    id: &str,
    data: MedicationUpdate,
) -> Result<UpdateMedicationResponse, String> {
    if data.is_empty() {
        return Ok(UpdateMedicationResponse {
            found: session.engine().medication(id).is_some(),
            medication: get_medication(session, id),
            note: Some("No fields to update".to_string()),
        });
    }

    let updated = session
        .update_medication(id, &data)
        .map_err(|e| e.to_string())?;

    Ok(match updated {
        Some(med) => UpdateMedicationResponse {
            found: true,
            medication: Some(detail(session, &med)),
            note: Some("Existing logs keep the name and dosage recorded when they were taken.".to_string()),
        },
        None => UpdateMedicationResponse {
            found: false,
            medication: None,
            note: None,
        },
    })
}

/// Delete a medication and all of its logs
pub fn delete_medication(
    session: &mut Session,
    id: &str,
) -> Result<DeleteMedicationResponse, String> {
    let deleted = session
        .delete_medication(id)
        .map_err(|e| e.to_string())?;

    Ok(DeleteMedicationResponse {
        found: deleted.is_some(),
        deleted_id: id.to_string(),
        removed_logs: deleted.map(|d| d.removed_logs).unwrap_or(0),
        stats: *session.engine().stats(),
    })
}
