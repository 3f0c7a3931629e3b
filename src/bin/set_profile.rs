//! Utility to set the profile a MedTrack database belongs to
//!
//! Usage: set_profile <name> <patient|caretaker> [email]

use medtrack::config::Config;
use medtrack::db::{migrations, Database};
use medtrack::models::{Profile, UserRole};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (name, role) = match (args.first(), args.get(1)) {
        (Some(name), Some(role)) => (name.clone(), role.clone()),
        _ => return Err("usage: set_profile <name> <patient|caretaker> [email]".into()),
    };
    let role = UserRole::from_str(&role)
        .ok_or_else(|| format!("Unknown role '{}': use patient or caretaker", role))?;
    let email = args.get(2).map(String::as_str);

    let db_path = Config::from_env().database_path;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    println!("Database path: {}", db_path.display());

    let database = Database::new(&db_path)?;
    let profile = database.with_conn(|conn| {
        migrations::run_migrations(conn)?;
        Profile::set(conn, &name, email, role)
    })?;

    println!("Profile set:");
    println!("  Name: {}", profile.name);
    println!("  Role: {}", profile.role.as_str());
    if let Some(email) = &profile.email {
        println!("  Email: {}", email);
    }
    println!("  Updated: {}", profile.updated_at);

    Ok(())
}
