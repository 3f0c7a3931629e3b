//! Medication log model
//!
//! One recorded dose. Name, dosage, and frequency are copied from the
//! medication at logging time so history stays readable after edits.

use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{frequency_column, timestamp_column, Frequency, Medication};
use crate::db::DbResult;

/// A dose marked as taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationLog {
    pub id: String,
    pub medication_id: String,
    pub taken_at: DateTime<Local>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
}

impl MedicationLog {
    /// Build a log entry for `medication`, snapshotting its current fields
    pub fn for_medication(
        id: String,
        medication: &Medication,
        taken_at: DateTime<Local>,
        photo_url: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id,
            medication_id: medication.id.clone(),
            taken_at,
            photo_url,
            notes,
            name: medication.name.clone(),
            dosage: medication.dosage.clone(),
            frequency: medication.frequency,
        }
    }

    /// Whether the dose was taken on the given local calendar day
    pub fn taken_on(&self, date: NaiveDate) -> bool {
        self.taken_at.date_naive() == date
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            medication_id: row.get("medication_id")?,
            taken_at: timestamp_column(row, "taken_at")?,
            photo_url: row.get("photo_url")?,
            notes: row.get("notes")?,
            name: row.get("name")?,
            dosage: row.get("dosage")?,
            frequency: frequency_column(row, "frequency")?,
        })
    }

    pub fn insert(conn: &Connection, log: &MedicationLog) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO medication_logs (
                id, medication_id, taken_at, photo_url, notes, name, dosage, frequency
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                log.id,
                log.medication_id,
                log.taken_at.to_rfc3339(),
                log.photo_url,
                log.notes,
                log.name,
                log.dosage,
                log.frequency.as_str(),
            ],
        )?;
        Ok(())
    }

    /// List all logs in insertion order
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM medication_logs ORDER BY rowid")?;
        let logs = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }

    pub fn delete(conn: &Connection, id: &str) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM medication_logs WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Delete every log of a medication, returning how many were removed
    pub fn delete_for_medication(conn: &Connection, medication_id: &str) -> DbResult<usize> {
        let rows = conn.execute(
            "DELETE FROM medication_logs WHERE medication_id = ?1",
            [medication_id],
        )?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use chrono::TimeZone;

    fn medication() -> Medication {
        Medication {
            id: "m1".to_string(),
            name: "Lisinopril".to_string(),
            dosage: "10mg".to_string(),
            frequency: Frequency::Once,
            times: vec!["08:00".to_string()],
            color: "#3B82F6".to_string(),
            notes: None,
            created_at: Local.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_for_medication_snapshots_fields() {
        let med = medication();
        let taken = Local.with_ymd_and_hms(2026, 6, 2, 8, 5, 0).unwrap();
        let log = MedicationLog::for_medication("l1".into(), &med, taken, None, Some("with food".into()));
        assert_eq!(log.medication_id, "m1");
        assert_eq!(log.name, "Lisinopril");
        assert_eq!(log.dosage, "10mg");
        assert_eq!(log.frequency, Frequency::Once);
        assert!(log.taken_on(NaiveDate::from_ymd_opt(2026, 6, 2).unwrap()));
        assert!(!log.taken_on(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()));
    }

    #[test]
    fn test_cascade_on_medication_delete() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();

        let med = medication();
        Medication::insert(&conn, &med).unwrap();
        let taken = Local.with_ymd_and_hms(2026, 6, 2, 8, 5, 0).unwrap();
        for id in ["l1", "l2"] {
            let log = MedicationLog::for_medication(id.into(), &med, taken, None, None);
            MedicationLog::insert(&conn, &log).unwrap();
        }
        assert_eq!(MedicationLog::list(&conn).unwrap().len(), 2);

        Medication::delete(&conn, "m1").unwrap();
        assert!(MedicationLog::list(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_delete_single_log() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let med = medication();
        Medication::insert(&conn, &med).unwrap();
        let taken = Local.with_ymd_and_hms(2026, 6, 2, 8, 5, 0).unwrap();
        let log = MedicationLog::for_medication("l1".into(), &med, taken, None, None);
        MedicationLog::insert(&conn, &log).unwrap();

        assert!(MedicationLog::delete(&conn, "l1").unwrap());
        assert!(!MedicationLog::delete(&conn, "l1").unwrap());
        assert_eq!(MedicationLog::delete_for_medication(&conn, "m1").unwrap(), 0);
    }
}
