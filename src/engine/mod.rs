//! Adherence engine
//!
//! In-memory medication and dose-log collections with derived adherence
//! stats, calendar views, and compliance reports.

pub mod adherence;
pub mod calendar;
pub mod clock;
pub mod report;
mod store;

pub use adherence::{compute_stats, LONGEST_STREAK_FLOOR, STREAK_WINDOW_DAYS};
pub use calendar::{CalendarDay, DoseStatus, MedicationDayStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use report::{ComplianceReport, MedicationCompliance};
pub use store::{AdherenceEngine, DeletedMedication};
