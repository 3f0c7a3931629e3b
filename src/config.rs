//! Runtime configuration
//!
//! Everything is read from the environment once at startup.

use std::path::PathBuf;

/// Overrides the SQLite file location
pub const DATABASE_PATH_VAR: &str = "MEDTRACK_DATABASE_PATH";

/// Log directive applied on top of `RUST_LOG`
pub const DEFAULT_LOG_DIRECTIVE: &str = "medtrack=info";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var(DATABASE_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_database_path()),
        }
    }
}

/// `<project>/data/medtrack.db`, stepping out of `target/{debug,release}`
/// when run from a cargo build directory
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("medtrack.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_file_name() {
        let path = default_database_path();
        assert!(path.ends_with("data/medtrack.db"));
    }
}
