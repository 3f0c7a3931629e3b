//! Calendar view
//!
//! Per-day taken/missed counts for a date range, the data behind a month
//! grid of adherence dots.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use super::adherence::{is_taken_on, logs_on};
use crate::models::{Medication, MedicationLog};

/// Days shown by [`calendar_window`]: five weeks
pub const CALENDAR_WINDOW_DAYS: u64 = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    Taken,
    Missed,
    Upcoming,
}

#[derive(Debug, Clone, Serialize)]
pub struct MedicationDayStatus {
    pub medication_id: String,
    pub name: String,
    pub color: String,
    pub status: DoseStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_today: bool,
    pub taken_count: usize,
    pub missed_count: usize,
    pub medications: Vec<MedicationDayStatus>,
}

/// Build `days` consecutive calendar entries starting at `start`
pub fn calendar_days(
    medications: &[Medication],
    logs: &[MedicationLog],
    start: NaiveDate,
    days: u64,
    today: NaiveDate,
) -> Vec<CalendarDay> {
    (0..days)
        .map_while(|offset| start.checked_add_days(Days::new(offset)))
        .map(|date| calendar_day(medications, logs, date, today))
        .collect()
}

fn calendar_day(
    medications: &[Medication],
    logs: &[MedicationLog],
    date: NaiveDate,
    today: NaiveDate,
) -> CalendarDay {
    let is_future = date > today;
    let taken_count = logs_on(logs, date).count();

    let medications: Vec<MedicationDayStatus> = medications
        .iter()
        .filter(|med| med.created_on_or_before(date))
        .map(|med| {
            let status = if is_taken_on(logs, &med.id, date) {
                DoseStatus::Taken
            } else if is_future {
                DoseStatus::Upcoming
            } else {
                DoseStatus::Missed
            };
            MedicationDayStatus {
                medication_id: med.id.clone(),
                name: med.name.clone(),
                color: med.color.clone(),
                status,
            }
        })
        .collect();

    // Several doses of one medication can exceed the medication count
    let missed_count = if is_future {
        0
    } else {
        medications.len().saturating_sub(taken_count)
    };

    CalendarDay {
        date,
        is_today: date == today,
        taken_count,
        missed_count,
        medications,
    }
}

/// First day of the default window: the Sunday starting last week
pub fn calendar_window_start(today: NaiveDate) -> NaiveDate {
    let back = u64::from(today.weekday().num_days_from_sunday()) + 7;
    today.checked_sub_days(Days::new(back)).unwrap_or(today)
}

/// Five weeks starting from the Sunday of the previous week
pub fn calendar_window(
    medications: &[Medication],
    logs: &[MedicationLog],
    today: NaiveDate,
) -> Vec<CalendarDay> {
    calendar_days(
        medications,
        logs,
        calendar_window_start(today),
        CALENDAR_WINDOW_DAYS,
        today,
    )
}
