//! MedTrack MCP Server Implementation
//!
//! Implements the MCP server with all MedTrack tools.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};

use crate::models::{Frequency, MedicationCreate, MedicationUpdate, UserRole};
use crate::session::Session;
use crate::tools::adherence;
use crate::tools::logs;
use crate::tools::medications;
use crate::tools::status::StatusTracker;

/// Color used when a medication is added without one
const DEFAULT_COLOR: &str = "#3B82F6";

/// MedTrack MCP Service
#[derive(Clone)]
pub struct MedTrackService {
    status_tracker: Arc<tokio::sync::Mutex<StatusTracker>>,
    session: Arc<Mutex<Session>>,
    tool_router: ToolRouter<MedTrackService>,
}

impl MedTrackService {
    pub fn new(database_path: PathBuf, session: Session) -> Self {
        Self {
            status_tracker: Arc::new(tokio::sync::Mutex::new(StatusTracker::new(database_path))),
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    fn session(&self) -> Result<MutexGuard<'_, Session>, McpError> {
        self.session
            .lock()
            .map_err(|_| McpError::internal_error("Session lock poisoned", None))
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn parse_frequency(s: &str) -> Result<Frequency, McpError> {
    Frequency::from_str(s).ok_or_else(|| {
        McpError::invalid_params(
            format!("Unknown frequency '{}': use once, twice, three_times, or four_times", s),
            None,
        )
    })
}

// ============================================================================
// Medication Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMedicationParams {
    /// Medication name (e.g., "Lisinopril")
    pub name: String,
    /// Dosage strength as free text (e.g., "10mg")
    pub dosage: String,
    /// Frequency: once, twice, three_times, four_times
    pub frequency: String,
    /// Scheduled times as HH:MM, one per daily dose. Omit for the default schedule.
    pub times: Option<Vec<String>>,
    /// Display color (hex, e.g. "#10B981")
    pub color: Option<String>,
    /// Notes (e.g., "Take with food")
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MedicationIdParams {
    /// Medication ID
    pub id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMedicationParams {
    /// Medication ID
    pub id: String,
    pub name: Option<String>,
    pub dosage: Option<String>,
    /// New frequency. Changing it requires a matching `times` list.
    pub frequency: Option<String>,
    /// Scheduled times as HH:MM
    pub times: Option<Vec<String>>,
    pub color: Option<String>,
    /// New notes; an empty string clears them
    pub notes: Option<String>,
}

// ============================================================================
// Log Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MarkTakenParams {
    /// Medication ID
    pub medication_id: String,
    /// Reference to a photo of the dose (optional)
    pub photo_url: Option<String>,
    /// Notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveLogParams {
    /// Log entry ID
    pub log_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogsForDateParams {
    /// Date in ISO format: YYYY-MM-DD (default today)
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListLogsParams {
    /// Only logs for this medication (optional)
    pub medication_id: Option<String>,
    /// Most recent N entries (default 50)
    #[serde(default = "default_log_limit")]
    pub limit: usize,
}

fn default_log_limit() -> usize { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TakenTodayParams {
    /// Medication ID
    pub medication_id: String,
}

// ============================================================================
// Adherence Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalendarParams {
    /// First day (YYYY-MM-DD). Omit for the five-week window around today.
    pub start: Option<String>,
    /// Number of days from start (default 31)
    pub days: Option<u64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReportParams {
    /// Start date (YYYY-MM-DD), default six days before end
    pub start: Option<String>,
    /// End date (YYYY-MM-DD), default today
    pub end: Option<String>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl MedTrackService {
    // --- Status ---

    #[tool(description = "Get the current status of the MedTrack service including build info, database status, and process information")]
    async fn medtrack_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = {
            let session = self.session()?;
            tracker.get_status(&session)
        };
        json_result(&status)
    }

    #[tool(description = "Get step-by-step instructions for tracking medications. Call this when starting a session or when unsure how to use the tools.")]
    fn medication_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::MEDICATION_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(MEDICATION_INSTRUCTIONS)]))
    }

    #[tool(description = "Get the profile (name and patient/caretaker role) this database belongs to")]
    fn get_profile(&self) -> Result<CallToolResult, McpError> {
        let session = self.session()?;
        let result = crate::tools::status::get_profile(&session).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Medications ---

    #[tool(description = "Add a medication. The number of times must match the frequency (once=1, twice=2, three_times=3, four_times=4).")]
    fn add_medication(&self, Parameters(p): Parameters<AddMedicationParams>) -> Result<CallToolResult, McpError> {
        let frequency = parse_frequency(&p.frequency)?;
        let data = MedicationCreate {
            name: p.name,
            dosage: p.dosage,
            frequency,
            times: p.times.unwrap_or_else(|| frequency.default_times()),
            color: p.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            notes: p.notes,
        };
        let mut session = self.session()?;
        let result = medications::add_medication(&mut session, data).map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get full details for a medication")]
    fn get_medication(&self, Parameters(p): Parameters<MedicationIdParams>) -> Result<CallToolResult, McpError> {
        let session = self.session()?;
        match medications::get_medication(&session, &p.id) {
            Some(med) => json_result(&med),
            None => json_result(&serde_json::json!({ "error": "Medication not found", "id": p.id })),
        }
    }

    #[tool(description = "List medications in the order they were added, with today's taken status")]
    fn list_medications(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session()?;
        json_result(&medications::list_medications(&mut session))
    }

    #[tool(description = "Update a medication. Only the given fields change; past logs keep their recorded name and dosage.")]
    fn update_medication(&self, Parameters(p): Parameters<UpdateMedicationParams>) -> Result<CallToolResult, McpError> {
        let data = MedicationUpdate {
            name: p.name,
            dosage: p.dosage,
            frequency: p.frequency.as_deref().map(parse_frequency).transpose()?,
            times: p.times,
            color: p.color,
            notes: p.notes,
        };
        let mut session = self.session()?;
        let result = medications::update_medication(&mut session, &p.id, data)
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a medication and every dose logged for it")]
    fn delete_medication(&self, Parameters(p): Parameters<MedicationIdParams>) -> Result<CallToolResult, McpError> {
        let mut session = self.session()?;
        let result = medications::delete_medication(&mut session, &p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Dose Logs ---

    #[tool(description = "Mark one dose of a medication as taken now. Call once per dose.")]
    fn mark_medication_taken(&self, Parameters(p): Parameters<MarkTakenParams>) -> Result<CallToolResult, McpError> {
        let mut session = self.session()?;
        let result = logs::mark_medication_taken(&mut session, &p.medication_id, p.photo_url, p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Remove a single dose log entry by its ID")]
    fn remove_medication_log(&self, Parameters(p): Parameters<RemoveLogParams>) -> Result<CallToolResult, McpError> {
        let mut session = self.session()?;
        let result = logs::remove_medication_log(&mut session, &p.log_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List doses logged on a calendar day (default today)")]
    fn list_logs_for_date(&self, Parameters(p): Parameters<LogsForDateParams>) -> Result<CallToolResult, McpError> {
        let session = self.session()?;
        let result = logs::list_logs_for_date(&session, p.date.as_deref())
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List the most recent dose logs, optionally for one medication")]
    fn list_logs(&self, Parameters(p): Parameters<ListLogsParams>) -> Result<CallToolResult, McpError> {
        let session = self.session()?;
        json_result(&logs::list_logs(&session, p.medication_id.as_deref(), p.limit))
    }

    #[tool(description = "Check whether at least one dose of a medication was logged today")]
    fn is_medication_taken_today(&self, Parameters(p): Parameters<TakenTodayParams>) -> Result<CallToolResult, McpError> {
        let session = self.session()?;
        json_result(&logs::is_medication_taken_today(&session, &p.medication_id))
    }

    // --- Adherence ---

    #[tool(description = "Get today's adherence: medications taken, percentage, current and best streak")]
    fn get_adherence_stats(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session()?;
        json_result(&adherence::get_adherence_stats(&mut session))
    }

    #[tool(description = "Get taken/missed counts per day for a date range (default: five weeks starting the Sunday of last week)")]
    fn get_calendar(&self, Parameters(p): Parameters<CalendarParams>) -> Result<CallToolResult, McpError> {
        let session = self.session()?;
        let result = adherence::get_calendar(&session, p.start.as_deref(), p.days)
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a compliance report (taken vs scheduled doses per medication) for a date range, default the last 7 days")]
    fn get_compliance_report(&self, Parameters(p): Parameters<ReportParams>) -> Result<CallToolResult, McpError> {
        let session = self.session()?;
        let result = adherence::get_compliance_report(&session, p.start.as_deref(), p.end.as_deref())
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Export a compliance report as a Markdown document for caretakers")]
    fn export_adherence_markdown(&self, Parameters(p): Parameters<ReportParams>) -> Result<CallToolResult, McpError> {
        let session = self.session()?;
        let result = adherence::export_adherence_markdown(&session, p.start.as_deref(), p.end.as_deref())
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

const PATIENT_INSTRUCTIONS: &str = "MedTrack - medication adherence tracking. \
     IMPORTANT: Call medication_instructions first. \
     Medications: add/get/list/update/delete_medication. \
     Doses: mark_medication_taken (once per dose), remove_medication_log, \
     list_logs_for_date, list_logs, is_medication_taken_today. \
     Progress: get_adherence_stats, get_calendar.";

const CARETAKER_INSTRUCTIONS: &str = "MedTrack - medication adherence monitoring. \
     IMPORTANT: Call medication_instructions first. \
     Reports: get_adherence_stats, get_calendar, get_compliance_report, export_adherence_markdown. \
     History: list_logs_for_date, list_logs, list_medications. \
     Medications can still be edited with add/update/delete_medication.";

#[tool_handler]
impl ServerHandler for MedTrackService {
    fn get_info(&self) -> ServerInfo {
        let role = self
            .session
            .lock()
            .ok()
            .and_then(|session| session.profile().ok().flatten())
            .map(|profile| profile.role)
            .unwrap_or_default();

        let instructions = match role {
            UserRole::Patient => PATIENT_INSTRUCTIONS,
            UserRole::Caretaker => CARETAKER_INSTRUCTIONS,
        };

        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "medtrack".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("MedTrack".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(instructions.into()),
        }
    }
}
