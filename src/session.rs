//! Tracking session
//!
//! Pairs an [`AdherenceEngine`] with the database it was loaded from. Every
//! mutation is written to the database first and only reaches the engine
//! once the write succeeds.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::db::{migrations, Database, DbError};
use crate::engine::{AdherenceEngine, Clock, DeletedMedication};
use crate::models::{
    AdherenceStats, Medication, MedicationCreate, MedicationLog, MedicationUpdate, Profile,
    ValidationError,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid medication: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type SessionResult<T> = Result<T, SessionError>;

pub struct Session {
    database: Database,
    engine: AdherenceEngine,
}

impl Session {
    /// Migrate the database and load its contents into a fresh engine
    pub fn open(database: Database, clock: Arc<dyn Clock>) -> SessionResult<Self> {
        let (medications, logs) = database.with_conn(|conn| {
            migrations::run_migrations(conn)?;
            Ok((Medication::list(conn)?, MedicationLog::list(conn)?))
        })?;

        info!(
            medications = medications.len(),
            logs = logs.len(),
            "Session opened"
        );

        Ok(Self {
            database,
            engine: AdherenceEngine::from_parts(medications, logs, clock),
        })
    }

    pub fn engine(&self) -> &AdherenceEngine {
        &self.engine
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Recompute stats for the current day (picks up midnight rollover)
    pub fn refresh_stats(&mut self) -> AdherenceStats {
        *self.engine.refresh_stats()
    }

    pub fn profile(&self) -> SessionResult<Option<Profile>> {
        Ok(self.database.with_conn(Profile::get)?)
    }

    pub fn add_medication(&mut self, data: MedicationCreate) -> SessionResult<Medication> {
        let medication = self.engine.build_medication(data)?;
        self.database
            .with_conn(|conn| Medication::insert(conn, &medication))?;
        Ok(self.engine.insert_medication(medication).clone())
    }

    pub fn update_medication(
        &mut self,
        id: &str,
        update: &MedicationUpdate,
    ) -> SessionResult<Option<Medication>> {
        let Some(medication) = self.engine.merged_medication(id, update)? else {
            return Ok(None);
        };
        self.database
            .with_conn(|conn| Medication::save(conn, &medication))?;
        Ok(self.engine.replace_medication(medication).cloned())
    }

    pub fn delete_medication(&mut self, id: &str) -> SessionResult<Option<DeletedMedication>> {
        if self.engine.medication(id).is_none() {
            return Ok(None);
        }
        self.database.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            MedicationLog::delete_for_medication(&tx, id)?;
            Medication::delete(&tx, id)?;
            tx.commit()?;
            Ok(())
        })?;
        Ok(self.engine.delete_medication(id))
    }

    pub fn mark_medication_taken(
        &mut self,
        medication_id: &str,
        photo_url: Option<String>,
        notes: Option<String>,
    ) -> SessionResult<Option<MedicationLog>> {
        let Some(log) = self.engine.build_log(medication_id, photo_url, notes) else {
            return Ok(None);
        };
        self.database
            .with_conn(|conn| MedicationLog::insert(conn, &log))?;
        Ok(Some(self.engine.insert_log(log).clone()))
    }

    pub fn remove_log(&mut self, log_id: &str) -> SessionResult<Option<MedicationLog>> {
        if self.engine.log(log_id).is_none() {
            return Ok(None);
        }
        self.database
            .with_conn(|conn| MedicationLog::delete(conn, log_id))?;
        Ok(self.engine.remove_log(log_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::{local_at, ManualClock};
    use crate::models::Frequency;
    use chrono::Duration;

    fn create(name: &str) -> MedicationCreate {
        MedicationCreate {
            name: name.to_string(),
            dosage: "10mg".to_string(),
            frequency: Frequency::Once,
            times: vec!["08:00".to_string()],
            color: "#3B82F6".to_string(),
            notes: Some("Take with food".to_string()),
        }
    }

    fn open() -> (Arc<ManualClock>, Database, Session) {
        let clock = Arc::new(ManualClock::new(local_at(2026, 6, 1, 8)));
        let db = Database::in_memory().unwrap();
        let session = Session::open(db.clone(), clock.clone()).unwrap();
        (clock, db, session)
    }

    #[test]
    fn test_reopen_restores_collections_and_stats() {
        let (clock, db, mut session) = open();
        let a = session.add_medication(create("A")).unwrap();
        let b = session.add_medication(create("B")).unwrap();
        session.mark_medication_taken(&a.id, None, None).unwrap();
        clock.advance(Duration::hours(1));
        session.mark_medication_taken(&b.id, None, Some("late".into())).unwrap();
        drop(session);

        let reopened = Session::open(db, clock).unwrap();
        let engine = reopened.engine();
        let names: Vec<_> = engine.medications().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(engine.logs().len(), 2);
        assert_eq!(engine.logs()[1].notes.as_deref(), Some("late"));
        assert_eq!(engine.stats().taken_today, 2);
        assert_eq!(engine.stats().adherence_percentage, 100);
    }

    #[test]
    fn test_update_writes_through() {
        let (_clock, db, mut session) = open();
        let med = session.add_medication(create("A")).unwrap();
        let update = MedicationUpdate {
            dosage: Some("20mg".to_string()),
            ..Default::default()
        };
        session.update_medication(&med.id, &update).unwrap().unwrap();
        assert!(session.update_medication("missing", &update).unwrap().is_none());

        let stored = db.with_conn(Medication::list).unwrap();
        assert_eq!(stored[0].id, med.id);
        assert_eq!(stored[0].dosage, "20mg");
    }

    #[test]
    fn test_invalid_add_touches_nothing() {
        let (_clock, db, mut session) = open();
        let mut data = create("A");
        data.times.clear();
        assert!(matches!(
            session.add_medication(data),
            Err(SessionError::Validation(_))
        ));
        assert!(db.with_conn(Medication::list).unwrap().is_empty());
    }

    #[test]
    fn test_delete_cascades_in_storage() {
        let (_clock, db, mut session) = open();
        let med = session.add_medication(create("A")).unwrap();
        session.mark_medication_taken(&med.id, None, None).unwrap();
        session.mark_medication_taken(&med.id, None, None).unwrap();

        let deleted = session.delete_medication(&med.id).unwrap().unwrap();
        assert_eq!(deleted.removed_logs, 2);
        assert!(session.delete_medication(&med.id).unwrap().is_none());
        assert!(db.with_conn(MedicationLog::list).unwrap().is_empty());
    }

    fn drop_table(db: &Database, table: &str) {
        db.with_conn(|conn| {
            conn.execute_batch(&format!("DROP TABLE {}", table))?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_failed_log_write_leaves_engine_unchanged() {
        let (_clock, db, mut session) = open();
        let med = session.add_medication(create("A")).unwrap();
        drop_table(&db, "medication_logs");

        assert!(matches!(
            session.mark_medication_taken(&med.id, None, None),
            Err(SessionError::Db(_))
        ));
        assert!(session.engine().logs().is_empty());
        assert_eq!(session.engine().stats().taken_today, 0);
        assert!(!session.engine().is_medication_taken_today(&med.id));

        // The cascade delete needs the log table too
        assert!(session.delete_medication(&med.id).is_err());
        assert_eq!(session.engine().medications().len(), 1);
        assert_eq!(session.engine().stats().total_medications, 1);
    }

    #[test]
    fn test_failed_medication_write_leaves_engine_unchanged() {
        let (_clock, db, mut session) = open();
        let med = session.add_medication(create("A")).unwrap();
        let log = session.mark_medication_taken(&med.id, None, None).unwrap().unwrap();
        drop_table(&db, "medication_logs");
        // Child table first so the foreign key cannot block the drop
        drop_table(&db, "medications");

        assert!(session.add_medication(create("B")).is_err());
        assert_eq!(session.engine().medications().len(), 1);

        let update = MedicationUpdate {
            dosage: Some("20mg".to_string()),
            ..Default::default()
        };
        assert!(session.update_medication(&med.id, &update).is_err());
        assert_eq!(session.engine().medications()[0].dosage, "10mg");

        assert!(session.remove_log(&log.id).is_err());
        assert_eq!(session.engine().logs().len(), 1);
        assert_eq!(session.engine().stats().taken_today, 1);
    }

    #[test]
    fn test_remove_log_writes_through() {
        let (_clock, db, mut session) = open();
        let med = session.add_medication(create("A")).unwrap();
        let log = session.mark_medication_taken(&med.id, None, None).unwrap().unwrap();
        assert!(session.mark_medication_taken("missing", None, None).unwrap().is_none());

        session.remove_log(&log.id).unwrap().unwrap();
        assert!(session.remove_log(&log.id).unwrap().is_none());
        assert!(db.with_conn(MedicationLog::list).unwrap().is_empty());
    }
}
