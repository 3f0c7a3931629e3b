//! Adherence MCP Tools
//!
//! Stats, calendar, and compliance reports for patients and caretakers.

use chrono::Days;
use serde::Serialize;

use super::{date_or, parse_date};
use crate::engine::calendar::{calendar_days, calendar_window};
use crate::engine::report::{compliance_report, render_markdown};
use crate::engine::{CalendarDay, ComplianceReport};
use crate::models::AdherenceStats;
use crate::session::Session;

/// Longest range accepted by the calendar and report tools
pub const MAX_RANGE_DAYS: u64 = 366;

/// Default report length when no start date is given
pub const DEFAULT_REPORT_DAYS: u64 = 7;

#[derive(Debug, Serialize)]
pub struct AdherenceStatsResponse {
    pub date: String,
    #[serde(flatten)]
    pub stats: AdherenceStats,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub start: String,
    pub end: String,
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Serialize)]
pub struct ExportReportResponse {
    pub markdown: String,
    pub medication_count: usize,
    pub generated_at: String,
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Current adherence stats, recomputed for today
pub fn get_adherence_stats(session: &mut Session) -> AdherenceStatsResponse {
    let stats = session.refresh_stats();
    AdherenceStatsResponse {
        date: session.engine().today().to_string(),
        summary: format!(
            "{}/{} medications taken today ({}%), {} day streak",
            stats.taken_today,
            stats.total_medications,
            stats.adherence_percentage,
            stats.current_streak
        ),
        stats,
    }
}

/// Calendar days from `start` for `days` days, or the default five-week window
pub fn get_calendar(
    session: &Session,
    start: Option<&str>,
    days: Option<u64>,
) -> Result<CalendarResponse, String> {
    let engine = session.engine();
    let today = engine.today();

    let days = match start {
        Some(start) => {
            let start = parse_date(start)?;
            let count = days.unwrap_or(31);
            if count == 0 || count > MAX_RANGE_DAYS {
                return Err(format!("days must be between 1 and {}", MAX_RANGE_DAYS));
            }
            calendar_days(engine.medications(), engine.logs(), start, count, today)
        }
        None => calendar_window(engine.medications(), engine.logs(), today),
    };

    let (first, last) = match (days.first(), days.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => (today, today),
    };

    Ok(CalendarResponse {
        start: first.to_string(),
        end: last.to_string(),
        days,
    })
}

/// Compliance over `[start, end]`; defaults to the last seven days
pub fn get_compliance_report(
    session: &Session,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<ComplianceReport, String> {
    let engine = session.engine();
    let end = date_or(end, engine.today())?;
    let start = match start {
        Some(s) => parse_date(s)?,
        None => end
            .checked_sub_days(Days::new(DEFAULT_REPORT_DAYS - 1))
            .unwrap_or(end),
    };

    if start > end {
        return Err(format!("start {} is after end {}", start, end));
    }
    if (end - start).num_days() as u64 >= MAX_RANGE_DAYS {
        return Err(format!("Report range cannot exceed {} days", MAX_RANGE_DAYS));
    }

    Ok(compliance_report(engine.medications(), engine.logs(), start, end))
}

/// Compliance report rendered as Markdown, headed with the profile name
pub fn export_adherence_markdown(
    session: &Session,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<ExportReportResponse, String> {
    let report = get_compliance_report(session, start, end)?;
    let profile = session.profile().map_err(|e| e.to_string())?;

    Ok(ExportReportResponse {
        markdown: render_markdown(&report, profile.as_ref().map(|p| p.name.as_str())),
        medication_count: report.medications.len(),
        generated_at: session.engine().clock().now().format("%Y-%m-%d %H:%M").to_string(),
    })
}
