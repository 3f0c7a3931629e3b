//! Medication model
//!
//! A drug the patient tracks, with a fixed number of daily doses at
//! scheduled clock times.

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{frequency_column, timestamp_column};
use crate::db::DbResult;

/// How many times a day a medication is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Once,
    Twice,
    #[serde(alias = "three-times")]
    ThreeTimes,
    #[serde(alias = "four-times")]
    FourTimes,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Once => "once",
            Frequency::Twice => "twice",
            Frequency::ThreeTimes => "three_times",
            Frequency::FourTimes => "four_times",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "once" | "1" | "daily" | "once_daily" => Some(Frequency::Once),
            "twice" | "2" | "twice_daily" => Some(Frequency::Twice),
            "three_times" | "three-times" | "3" => Some(Frequency::ThreeTimes),
            "four_times" | "four-times" | "4" => Some(Frequency::FourTimes),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Frequency::Once => "Once daily",
            Frequency::Twice => "Twice daily",
            Frequency::ThreeTimes => "Three times daily",
            Frequency::FourTimes => "Four times daily",
        }
    }

    /// Number of doses expected per day
    pub fn dose_count(&self) -> usize {
        match self {
            Frequency::Once => 1,
            Frequency::Twice => 2,
            Frequency::ThreeTimes => 3,
            Frequency::FourTimes => 4,
        }
    }

    /// Default schedule: first dose at 08:00, then every six hours
    pub fn default_times(&self) -> Vec<String> {
        (0..self.dose_count())
            .map(|i| format!("{:02}:00", (8 + i * 6) % 24))
            .collect()
    }
}

/// Why a medication's fields were rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Medication name cannot be empty")]
    EmptyName,

    #[error("{frequency} needs {expected} scheduled time(s), got {actual}")]
    TimeCountMismatch {
        frequency: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid scheduled time '{0}', expected HH:MM")]
    InvalidTime(String),
}

/// A tracked medication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub times: Vec<String>,
    pub color: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Local>,
}

/// Data for creating a new medication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationCreate {
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub times: Vec<String>,
    pub color: String,
    pub notes: Option<String>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationUpdate {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<Frequency>,
    pub times: Option<Vec<String>>,
    pub color: Option<String>,
    /// An empty string clears the notes
    pub notes: Option<String>,
}

/// Check a name and dose schedule against a frequency
pub fn validate_schedule(
    name: &str,
    frequency: Frequency,
    times: &[String],
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if times.len() != frequency.dose_count() {
        return Err(ValidationError::TimeCountMismatch {
            frequency: frequency.as_str(),
            expected: frequency.dose_count(),
            actual: times.len(),
        });
    }

    for t in times {
        if NaiveTime::parse_from_str(t, "%H:%M").is_err() {
            return Err(ValidationError::InvalidTime(t.clone()));
        }
    }

    Ok(())
}

impl MedicationCreate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_schedule(&self.name, self.frequency, &self.times)
    }
}

impl MedicationUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.dosage.is_none()
            && self.frequency.is_none()
            && self.times.is_none()
            && self.color.is_none()
            && self.notes.is_none()
    }
}

impl Medication {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_schedule(&self.name, self.frequency, &self.times)
    }

    /// Merge the fields present in `update` into this medication
    pub fn apply(&mut self, update: &MedicationUpdate) {
        if let Some(ref name) = update.name {
            self.name = name.clone();
        }
        if let Some(ref dosage) = update.dosage {
            self.dosage = dosage.clone();
        }
        if let Some(frequency) = update.frequency {
            self.frequency = frequency;
        }
        if let Some(ref times) = update.times {
            self.times = times.clone();
        }
        if let Some(ref color) = update.color {
            self.color = color.clone();
        }
        if let Some(ref notes) = update.notes {
            self.notes = match notes.trim() {
                "" => None,
                _ => Some(notes.clone()),
            };
        }
    }

    /// Whether the medication already existed on `date`
    pub fn created_on_or_before(&self, date: NaiveDate) -> bool {
        self.created_at.date_naive() <= date
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let times_json: String = row.get("times")?;
        let times: Vec<String> = serde_json::from_str(&times_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            dosage: row.get("dosage")?,
            frequency: frequency_column(row, "frequency")?,
            times,
            color: row.get("color")?,
            notes: row.get("notes")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }

    /// Insert a medication built by the engine
    pub fn insert(conn: &Connection, med: &Medication) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO medications (id, name, dosage, frequency, times, color, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                med.id,
                med.name,
                med.dosage,
                med.frequency.as_str(),
                serde_json::to_string(&med.times)?,
                med.color,
                med.notes,
                med.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List all medications in insertion order
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM medications ORDER BY rowid")?;
        let meds = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(meds)
    }

    /// Overwrite the stored row with the in-memory state
    pub fn save(conn: &Connection, med: &Medication) -> DbResult<bool> {
        let rows = conn.execute(
            r#"
            UPDATE medications SET
                name = ?1,
                dosage = ?2,
                frequency = ?3,
                times = ?4,
                color = ?5,
                notes = ?6
            WHERE id = ?7
            "#,
            params![
                med.name,
                med.dosage,
                med.frequency.as_str(),
                serde_json::to_string(&med.times)?,
                med.color,
                med.notes,
                med.id,
            ],
        )?;
        Ok(rows > 0)
    }

    /// Delete a medication; its logs go with it via the foreign key
    pub fn delete(conn: &Connection, id: &str) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM medications WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
