//! MedTrack Status Tool
//!
//! Runtime status, profile lookup, and usage instructions.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::models::Profile;
use crate::session::Session;

/// Medication tracking instructions for AI assistants
pub const MEDICATION_INSTRUCTIONS: &str = r#"
# MedTrack Instructions

MedTrack tracks which medications a patient takes each day and derives
adherence stats and streaks from the dose log.

## Adding a medication

Call `add_medication` with:
- `name`, `dosage` (free text, e.g. "10mg")
- `frequency`: `once`, `twice`, `three_times`, or `four_times`
- `times`: one `HH:MM` entry per daily dose. Omit to use the default
  schedule (08:00, then every six hours).
- `color` (optional, hex), `notes` (optional)

The number of times must match the frequency. `twice` with one time is
rejected.

## Logging doses

- `mark_medication_taken` records one dose at the current time. Call it once
  per dose; a twice-daily medication is logged twice.
- A medication counts as "taken today" as soon as one dose is logged.
- `remove_medication_log` undoes a mistaken entry (use the log `id`).

## Reading history

- `list_logs_for_date` with `date` (YYYY-MM-DD), default today
- `get_adherence_stats` for today's progress and streaks
- `get_calendar` for taken/missed per day
- `get_compliance_report` / `export_adherence_markdown` for caretakers

## Streaks

A day counts toward the streak when the number of logged doses equals the
number of medications that existed that day. Days before the first
medication are skipped. The scan looks back at most 30 days. The best streak
is reported as at least 7.

## Edits and deletion

- `update_medication` changes only the fields given. Past logs keep the name
  and dosage recorded at the time.
- `delete_medication` also deletes every log of that medication.
"#;

/// Service status snapshot
#[derive(Debug, Serialize)]
pub struct MedTrackStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
    pub medication_count: usize,
    pub log_count: usize,
    pub role: Option<String>,
}

/// Response for get_profile
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub configured: bool,
    pub profile: Option<Profile>,
}

/// Tracks service uptime and reports status
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    pub fn get_status(&self, session: &Session) -> MedTrackStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        // Status should still render if the profile read fails
        let role = session
            .profile()
            .ok()
            .flatten()
            .map(|p| p.role.as_str().to_string());

        MedTrackStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
            medication_count: session.engine().medications().len(),
            log_count: session.engine().logs().len(),
            role,
        }
    }
}

/// The configured profile, if any
pub fn get_profile(session: &Session) -> Result<ProfileResponse, String> {
    let profile = session.profile().map_err(|e| e.to_string())?;
    Ok(ProfileResponse {
        configured: profile.is_some(),
        profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::engine::clock::{local_at, ManualClock};
    use crate::models::UserRole;
    use std::sync::Arc;

    fn session() -> Session {
        let clock = Arc::new(ManualClock::new(local_at(2026, 7, 1, 8)));
        Session::open(Database::in_memory().unwrap(), clock).unwrap()
    }

    #[test]
    fn test_status_reports_counts_and_role() {
        let session = session();
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/medtrack.db"));

        let status = tracker.get_status(&session);
        assert_eq!(status.medication_count, 0);
        assert!(status.database_size_bytes.is_none());
        assert!(status.role.is_none());

        session
            .database()
            .with_conn(|conn| Profile::set(conn, "Sam", None, UserRole::Caretaker))
            .unwrap();
        assert_eq!(tracker.get_status(&session).role.as_deref(), Some("caretaker"));
    }

    #[test]
    fn test_get_profile() {
        let session = session();
        assert!(!get_profile(&session).unwrap().configured);

        session
            .database()
            .with_conn(|conn| Profile::set(conn, "Sam", Some("sam@example.com"), UserRole::Patient))
            .unwrap();
        let response = get_profile(&session).unwrap();
        assert!(response.configured);
        assert_eq!(response.profile.unwrap().name, "Sam");
    }
}
