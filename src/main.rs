//! MedTrack
//!
//! An MCP server for medication adherence tracking.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use medtrack::build_info;
use medtrack::config::{Config, DEFAULT_LOG_DIRECTIVE};
use medtrack::db::{migrations, Database};
use medtrack::engine::SystemClock;
use medtrack::mcp::MedTrackService;
use medtrack::session::Session;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the MCP protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(DEFAULT_LOG_DIRECTIVE.parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    let db_path = config.database_path;
    eprintln!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = Database::new(&db_path)?;

    // Session::open migrates before loading
    let session = Session::open(database, Arc::new(SystemClock))?;
    let version = session.database().with_conn(migrations::get_schema_version)?;
    eprintln!("Database schema version: {}", version);

    let service = MedTrackService::new(db_path, session);

    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;

    Ok(())
}
