//! Adherence calculations
//!
//! Pure functions over medication and log slices. Everything is keyed by
//! local calendar day.

use chrono::{Days, NaiveDate};

use crate::models::{AdherenceStats, Medication, MedicationLog};

/// How far back the streak scan looks
pub const STREAK_WINDOW_DAYS: u64 = 30;

/// Lower bound reported for the longest streak. Placeholder: historical
/// maxima are not tracked.
pub const LONGEST_STREAK_FLOOR: u32 = 7;

/// Logs taken on `date`, in insertion order
pub fn logs_on(logs: &[MedicationLog], date: NaiveDate) -> impl Iterator<Item = &MedicationLog> {
    logs.iter().filter(move |log| log.taken_on(date))
}

/// True if at least one dose of the medication was logged on `date`
pub fn is_taken_on(logs: &[MedicationLog], medication_id: &str, date: NaiveDate) -> bool {
    logs_on(logs, date).any(|log| log.medication_id == medication_id)
}

/// Number of medications that existed on `date`
pub fn medications_for_date(medications: &[Medication], date: NaiveDate) -> usize {
    medications
        .iter()
        .filter(|med| med.created_on_or_before(date))
        .count()
}

/// `taken / total` as a whole percentage, halves rounding up
pub fn adherence_percentage(taken: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let taken = taken.min(total);
    // Integer form of round(taken * 100 / total)
    ((taken * 200 + total) / (total * 2)) as u8
}

/// Consecutive fully-logged days ending today.
///
/// Days before any medication existed are skipped. The first day whose log
/// count differs from its medication count ends the streak.
pub fn current_streak(medications: &[Medication], logs: &[MedicationLog], today: NaiveDate) -> u32 {
    let mut streak = 0;

    for offset in 0..STREAK_WINDOW_DAYS {
        let Some(day) = today.checked_sub_days(Days::new(offset)) else {
            break;
        };

        // Nothing scheduled yet
        let expected = medications_for_date(medications, day);
        if expected == 0 {
            continue;
        }

        // Counts doses, not distinct medications
        if logs_on(logs, day).count() == expected {
            streak += 1;
        } else {
            break;
        }
    }

    streak
}

/// Recompute the full stats snapshot
pub fn compute_stats(
    medications: &[Medication],
    logs: &[MedicationLog],
    today: NaiveDate,
) -> AdherenceStats {
    let total_medications = medications.len();
    // Any logged dose marks a medication as taken
    let taken_today = medications
        .iter()
        .filter(|med| is_taken_on(logs, &med.id, today))
        .count();
    let current_streak = current_streak(medications, logs, today);

    AdherenceStats {
        total_medications,
        taken_today,
        adherence_percentage: adherence_percentage(taken_today, total_medications),
        current_streak,
        longest_streak: current_streak.max(LONGEST_STREAK_FLOOR),
    }
}
