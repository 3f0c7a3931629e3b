//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- MEDICATIONS
        -- What the patient is scheduled to take
        -- ============================================
        CREATE TABLE medications (
            id TEXT PRIMARY KEY,                 -- uuid v4
            name TEXT NOT NULL,
            dosage TEXT NOT NULL,                -- free text, e.g. "10mg"
            frequency TEXT NOT NULL CHECK(frequency IN ('once', 'twice', 'three_times', 'four_times')),
            times TEXT NOT NULL,                 -- JSON array of "HH:MM", one per daily dose
            color TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL             -- RFC 3339, local offset
        );

        -- ============================================
        -- MEDICATION LOGS
        -- One row per dose marked as taken
        -- ============================================
        CREATE TABLE medication_logs (
            id TEXT PRIMARY KEY,
            medication_id TEXT NOT NULL REFERENCES medications(id) ON DELETE CASCADE,
            taken_at TEXT NOT NULL,
            photo_url TEXT,
            notes TEXT,

            -- Snapshot of the medication when the dose was logged
            name TEXT NOT NULL,
            dosage TEXT NOT NULL,
            frequency TEXT NOT NULL
        );

        CREATE INDEX idx_medication_logs_medication ON medication_logs(medication_id);
        CREATE INDEX idx_medication_logs_taken_at ON medication_logs(taken_at);

        -- ============================================
        -- PROFILE
        -- Single row: who this database belongs to
        -- ============================================
        CREATE TABLE profile (
            id INTEGER PRIMARY KEY CHECK(id = 1),
            name TEXT NOT NULL,
            email TEXT,
            role TEXT NOT NULL CHECK(role IN ('patient', 'caretaker')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_frequency_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO medications (id, name, dosage, frequency, times, color, created_at)
             VALUES ('m1', 'X', '1mg', 'hourly', '[]', '#000000', '2026-01-01T08:00:00+00:00')",
            [],
        );
        assert!(result.is_err());
    }
}
