//! Compliance reports
//!
//! Taken vs. scheduled doses per medication over an inclusive date range.

use chrono::NaiveDate;
use serde::Serialize;

use super::adherence::adherence_percentage;
use crate::models::{Medication, MedicationLog};

#[derive(Debug, Clone, Serialize)]
pub struct MedicationCompliance {
    pub medication_id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub taken: usize,
    pub scheduled: usize,
    pub compliance_percentage: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: i64,
    pub medications: Vec<MedicationCompliance>,
    pub total_taken: usize,
    pub total_scheduled: usize,
    pub compliance_percentage: u8,
}

/// Days in `[from, end]`, zero when `from` is after `end`
fn inclusive_days(from: NaiveDate, end: NaiveDate) -> i64 {
    ((end - from).num_days() + 1).max(0)
}

/// Build a report for `[start, end]`.
///
/// A medication created inside the range is only scheduled from its
/// creation day on.
pub fn compliance_report(
    medications: &[Medication],
    logs: &[MedicationLog],
    start: NaiveDate,
    end: NaiveDate,
) -> ComplianceReport {
    let in_range = |log: &&MedicationLog| {
        let date = log.taken_at.date_naive();
        date >= start && date <= end
    };

    let rows: Vec<MedicationCompliance> = medications
        .iter()
        .map(|med| {
            // Nothing was due before the medication existed
            let from = start.max(med.created_at.date_naive());
            let scheduled = inclusive_days(from, end) as usize * med.frequency.dose_count();
            let taken = logs
                .iter()
                .filter(in_range)
                .filter(|log| log.medication_id == med.id)
                .count();

            MedicationCompliance {
                medication_id: med.id.clone(),
                name: med.name.clone(),
                dosage: med.dosage.clone(),
                frequency: med.frequency.display_name().to_string(),
                taken,
                scheduled,
                compliance_percentage: adherence_percentage(taken, scheduled),
            }
        })
        .collect();

    // Extra doses on one medication must not cover for missed ones on another
    let total_taken = rows.iter().map(|r| r.taken.min(r.scheduled)).sum();
    let total_scheduled = rows.iter().map(|r| r.scheduled).sum();

    ComplianceReport {
        start,
        end,
        days: inclusive_days(start, end),
        medications: rows,
        total_taken,
        total_scheduled,
        compliance_percentage: adherence_percentage(total_taken, total_scheduled),
    }
}

/// Render a report as a Markdown document for caretakers
pub fn render_markdown(report: &ComplianceReport, patient_name: Option<&str>) -> String {
    let mut md = String::new();

    // Header
    md.push_str("# Medication Compliance Report\n\n");
    if let Some(name) = patient_name {
        md.push_str(&format!("**Patient:** {}\n\n", name));
    }
    md.push_str(&format!(
        "**Period:** {} to {} ({} days)\n\n",
        report.start, report.end, report.days
    ));
    md.push_str(&format!(
        "**Overall compliance:** {}% ({} of {} scheduled doses)\n\n",
        report.compliance_percentage, report.total_taken, report.total_scheduled
    ));

    if report.medications.is_empty() {
        md.push_str("_No medications tracked._\n");
        return md;
    }

    // Per-medication table
    md.push_str("| Medication | Dosage | Frequency | Taken | Scheduled | Compliance |\n");
    md.push_str("|------------|--------|-----------|-------|-----------|------------|\n");
    for row in &report.medications {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {}% |\n",
            row.name, row.dosage, row.frequency, row.taken, row.scheduled, row.compliance_percentage
        ));
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::local_at;
    use crate::models::Frequency;

    fn med(id: &str, frequency: Frequency, created_day: u32) -> Medication {
        Medication {
            id: id.to_string(),
            name: format!("Med {}", id),
            dosage: "500mg".to_string(),
            frequency,
            times: frequency.default_times(),
            color: "#10B981".to_string(),
            notes: None,
            created_at: local_at(2026, 5, created_day, 9),
        }
    }

    fn log(medication_id: &str, taken_day: u32) -> MedicationLog {
        MedicationLog {
            id: format!("{}-{}", medication_id, taken_day),
            medication_id: medication_id.to_string(),
            taken_at: local_at(2026, 5, taken_day, 10),
            photo_url: None,
            notes: None,
            name: format!("Med {}", medication_id),
            dosage: "500mg".to_string(),
            frequency: Frequency::Once,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn test_weekly_report() {
        let meds = vec![med("1", Frequency::Once, 1), med("2", Frequency::Twice, 1)];
        let mut logs: Vec<_> = (4..=10).map(|d| log("1", d)).collect();
        logs.push(log("2", 4));
        logs.push(log("2", 5));
        logs.push(log("1", 11)); // outside the range

        let report = compliance_report(&meds, &logs, day(4), day(10));
        assert_eq!(report.days, 7);
        assert_eq!(report.medications[0].taken, 7);
        assert_eq!(report.medications[0].scheduled, 7);
        assert_eq!(report.medications[0].compliance_percentage, 100);
        assert_eq!(report.medications[1].scheduled, 14);
        assert_eq!(report.medications[1].compliance_percentage, 14);
        assert_eq!(report.total_taken, 9);
        assert_eq!(report.total_scheduled, 21);
        assert_eq!(report.compliance_percentage, 43);
    }

    #[test]
    fn test_scheduled_starts_at_creation() {
        let meds = vec![med("1", Frequency::Once, 8)];
        let report = compliance_report(&meds, &[], day(4), day(10));
        assert_eq!(report.medications[0].scheduled, 3);
        assert_eq!(report.compliance_percentage, 0);
    }

    #[test]
    fn test_created_after_range_is_not_scheduled() {
        let meds = vec![med("1", Frequency::Once, 20)];
        let report = compliance_report(&meds, &[], day(4), day(10));
        assert_eq!(report.medications[0].scheduled, 0);
        assert_eq!(report.medications[0].compliance_percentage, 0);
    }

    #[test]
    fn test_extra_doses_capped_at_full_compliance() {
        let meds = vec![med("1", Frequency::Once, 1)];
        let logs = vec![log("1", 4), log("1", 4)];
        let report = compliance_report(&meds, &logs, day(4), day(4));
        assert_eq!(report.medications[0].compliance_percentage, 100);
        assert_eq!(report.compliance_percentage, 100);
    }

    #[test]
    fn test_render_markdown() {
        let meds = vec![med("1", Frequency::Once, 1)];
        let logs = vec![log("1", 4)];
        let report = compliance_report(&meds, &logs, day(4), day(5));
        let md = render_markdown(&report, Some("Eleanor Thompson"));
        assert!(md.contains("**Patient:** Eleanor Thompson"));
        assert!(md.contains("**Overall compliance:** 50% (1 of 2 scheduled doses)"));
        assert!(md.contains("| Med 1 | 500mg | Once daily | 1 | 2 | 50% |"));

        let empty = compliance_report(&[], &[], day(4), day(5));
        assert!(render_markdown(&empty, None).contains("_No medications tracked._"));
    }
}
