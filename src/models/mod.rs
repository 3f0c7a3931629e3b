//! Data models
//!
//! Rust structs representing tracked medications, dose logs, and derived stats.

mod medication;
mod medication_log;
mod profile;
mod stats;

pub use medication::{
    Frequency, Medication, MedicationCreate, MedicationUpdate, ValidationError,
};
pub use medication_log::MedicationLog;
pub use profile::{Profile, UserRole};
pub use stats::AdherenceStats;

use chrono::{DateTime, Local};
use rusqlite::types::Type;
use rusqlite::Row;

/// Read an RFC 3339 text column as a local timestamp
pub(crate) fn timestamp_column(row: &Row, name: &str) -> rusqlite::Result<DateTime<Local>> {
    let raw: String = row.get(name)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|e| conversion_error(row, name, e))
}

/// Read a frequency text column
pub(crate) fn frequency_column(row: &Row, name: &str) -> rusqlite::Result<Frequency> {
    let raw: String = row.get(name)?;
    Frequency::from_str(&raw)
        .ok_or_else(|| conversion_error(row, name, format!("unknown frequency: {}", raw)))
}

fn conversion_error<E>(row: &Row, name: &str, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let idx = row.as_ref().column_index(name).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}
