//! Dose log MCP Tools
//!
//! Mark doses taken, undo them, and read intake history.

use serde::Serialize;

use super::date_or;
use crate::models::{AdherenceStats, MedicationLog};
use crate::session::Session;

/// One log entry as returned to clients
#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub medication_id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub taken_at: String,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

impl From<&MedicationLog> for LogEntry {
    fn from(log: &MedicationLog) -> Self {
        Self {
            id: log.id.clone(),
            medication_id: log.medication_id.clone(),
            name: log.name.clone(),
            dosage: log.dosage.clone(),
            frequency: log.frequency.as_str().to_string(),
            taken_at: log.taken_at.to_rfc3339(),
            photo_url: log.photo_url.clone(),
            notes: log.notes.clone(),
        }
    }
}

/// Response for mark_medication_taken
#[derive(Debug, Serialize)]
pub struct MarkTakenResponse {
    pub found: bool,
    pub log: Option<LogEntry>,
    pub doses_logged_today: usize,
    pub doses_per_day: usize,
    pub stats: AdherenceStats,
}

/// Response for remove_medication_log
#[derive(Debug, Serialize)]
pub struct RemoveLogResponse {
    pub found: bool,
    pub removed_id: String,
    pub stats: AdherenceStats,
}

/// Response for list_logs_for_date and list_logs
#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub date: Option<String>,
    pub logs: Vec<LogEntry>,
    pub total: usize,
}

/// Response for is_medication_taken_today
#[derive(Debug, Serialize)]
pub struct TakenTodayResponse {
    pub medication_id: String,
    pub found: bool,
    pub taken_today: bool,
    pub doses_logged_today: usize,
}

fn doses_logged_today(session: &Session, medication_id: &str) -> usize {
    let engine = session.engine();
    engine
        .logs_for_date(engine.today())
        .into_iter()
        .filter(|log| log.medication_id == medication_id)
        .count()
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Record a dose as taken now
pub fn mark_medication_taken(
    session: &mut Session,
    medication_id: &str,
    photo_url: Option<String>,
    notes: Option<String>,
) -> Result<MarkTakenResponse, String> {
    let log = session
        .mark_medication_taken(medication_id, photo_url, notes)
        .map_err(|e| e.to_string())?;

    let doses_per_day = session
        .engine()
        .medication(medication_id)
        .map(|med| med.frequency.dose_count())
        .unwrap_or(0);

    Ok(MarkTakenResponse {
        found: log.is_some(),
        log: log.as_ref().map(LogEntry::from),
        doses_logged_today: doses_logged_today(session, medication_id),
        doses_per_day,
        stats: *session.engine().stats(),
    })
}

/// Remove a single log entry
pub fn remove_medication_log(session: &mut Session, log_id: &str) -> Result<RemoveLogResponse, String> {
    let removed = session.remove_log(log_id).map_err(|e| e.to_string())?;

    Ok(RemoveLogResponse {
        found: removed.is_some(),
        removed_id: log_id.to_string(),
        stats: *session.engine().stats(),
    })
}

/// Logs for one calendar day (today when no date is given)
pub fn list_logs_for_date(session: &Session, date: Option<&str>) -> Result<LogsResponse, String> {
    let engine = session.engine();
    let date = date_or(date, engine.today())?;

    let logs: Vec<LogEntry> = engine
        .logs_for_date(date)
        .into_iter()
        .map(LogEntry::from)
        .collect();

    Ok(LogsResponse {
        date: Some(date.to_string()),
        total: logs.len(),
        logs,
    })
}

/// All logs, optionally for one medication, most recent `limit` entries
pub fn list_logs(session: &Session, medication_id: Option<&str>, limit: usize) -> LogsResponse {
    let matching: Vec<&MedicationLog> = session
        .engine()
        .logs()
        .iter()
        .filter(|log| medication_id.map_or(true, |id| log.medication_id == id))
        .collect();

    let skip = matching.len().saturating_sub(limit);
    let logs: Vec<LogEntry> = matching[skip..].iter().copied().map(LogEntry::from).collect();

    LogsResponse {
        date: None,
        total: logs.len(),
        logs,
    }
}

/// Whether any dose of the medication was logged today
pub fn is_medication_taken_today(session: &Session, medication_id: &str) -> TakenTodayResponse {
    let engine = session.engine();
    TakenTodayResponse {
        medication_id: medication_id.to_string(),
        found: engine.medication(medication_id).is_some(),
        taken_today: engine.is_medication_taken_today(medication_id),
        doses_logged_today: doses_logged_today(session, medication_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::engine::clock::{local_at, ManualClock};
    use crate::models::{Frequency, MedicationCreate};
    use chrono::Duration;
    use std::sync::Arc;

    fn setup() -> (Arc<ManualClock>, Session, String) {
        let clock = Arc::new(ManualClock::new(local_at(2026, 7, 1, 8)));
        let mut session = Session::open(Database::in_memory().unwrap(), clock.clone()).unwrap();
        let med = session
            .add_medication(MedicationCreate {
                name: "Metformin".to_string(),
                dosage: "500mg".to_string(),
                frequency: Frequency::Twice,
                times: vec!["08:00".to_string(), "20:00".to_string()],
                color: "#10B981".to_string(),
                notes: None,
            })
            .unwrap();
        (clock, session, med.id)
    }

    #[test]
    fn test_mark_taken_reports_progress() {
        let (clock, mut session, id) = setup();
        let first = mark_medication_taken(&mut session, &id, None, Some("breakfast".into())).unwrap();
        assert!(first.found);
        assert_eq!(first.doses_logged_today, 1);
        assert_eq!(first.doses_per_day, 2);
        assert_eq!(first.stats.taken_today, 1);

        clock.advance(Duration::hours(12));
        let second = mark_medication_taken(&mut session, &id, None, None).unwrap();
        assert_eq!(second.doses_logged_today, 2);
        assert_eq!(second.stats.taken_today, 1);
    }

    #[test]
    fn test_mark_unknown_medication() {
        let (_clock, mut session, _id) = setup();
        let result = mark_medication_taken(&mut session, "missing", None, None).unwrap();
        assert!(!result.found);
        assert!(result.log.is_none());
        assert!(session.engine().logs().is_empty());
    }

    #[test]
    fn test_logs_for_date() {
        let (clock, mut session, id) = setup();
        mark_medication_taken(&mut session, &id, None, None).unwrap();
        mark_medication_taken(&mut session, &id, None, None).unwrap();

        let today = list_logs_for_date(&session, None).unwrap();
        assert_eq!(today.total, 2);
        assert_eq!(today.date.as_deref(), Some("2026-07-01"));

        let empty = list_logs_for_date(&session, Some("2026-06-30")).unwrap();
        assert_eq!(empty.total, 0);
        assert!(empty.logs.is_empty());

        assert!(list_logs_for_date(&session, Some("yesterday")).is_err());

        clock.advance(Duration::days(1));
        assert_eq!(list_logs_for_date(&session, None).unwrap().total, 0);
    }

    #[test]
    fn test_list_logs_limit_keeps_latest() {
        let (clock, mut session, id) = setup();
        for _ in 0..5 {
            mark_medication_taken(&mut session, &id, None, None).unwrap();
            clock.advance(Duration::hours(1));
        }
        let all = list_logs(&session, None, 100);
        assert_eq!(all.total, 5);

        let latest = list_logs(&session, Some(&id), 2);
        assert_eq!(latest.total, 2);
        assert_eq!(latest.logs[1].id, all.logs[4].id);

        assert_eq!(list_logs(&session, Some("missing"), 10).total, 0);
    }

    #[test]
    fn test_remove_and_taken_today() {
        let (_clock, mut session, id) = setup();
        let marked = mark_medication_taken(&mut session, &id, None, None).unwrap();
        assert!(is_medication_taken_today(&session, &id).taken_today);

        let log_id = marked.log.unwrap().id;
        let removed = remove_medication_log(&mut session, &log_id).unwrap();
        assert!(removed.found);
        assert_eq!(removed.stats.taken_today, 0);

        let status = is_medication_taken_today(&session, &id);
        assert!(status.found);
        assert!(!status.taken_today);

        assert!(!remove_medication_log(&mut session, &log_id).unwrap().found);
    }
}
