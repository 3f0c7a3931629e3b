//! Utility to seed an empty database with two demo medications

use std::sync::Arc;

use medtrack::config::Config;
use medtrack::db::Database;
use medtrack::engine::SystemClock;
use medtrack::models::{Frequency, MedicationCreate};
use medtrack::session::Session;

fn demo_medications() -> Vec<MedicationCreate> {
    vec![
        MedicationCreate {
            name: "Lisinopril".to_string(),
            dosage: "10mg".to_string(),
            frequency: Frequency::Once,
            times: vec!["08:00".to_string()],
            color: "#3B82F6".to_string(),
            notes: Some("Take with food".to_string()),
        },
        MedicationCreate {
            name: "Metformin".to_string(),
            dosage: "500mg".to_string(),
            frequency: Frequency::Twice,
            times: vec!["08:00".to_string(), "20:00".to_string()],
            color: "#10B981".to_string(),
            notes: Some("Take with meals".to_string()),
        },
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = Config::from_env().database_path;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    println!("Database path: {}", db_path.display());

    let mut session = Session::open(Database::new(&db_path)?, Arc::new(SystemClock))?;
    if !session.engine().medications().is_empty() {
        println!(
            "Database already has {} medication(s), nothing to seed",
            session.engine().medications().len()
        );
        return Ok(());
    }

    for data in demo_medications() {
        let med = session.add_medication(data)?;
        println!("  Added {} {} ({})", med.name, med.dosage, med.frequency.display_name());
    }

    Ok(())
}
