//! Profile model
//!
//! Who the database belongs to and in which role they use it.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Role of the person using the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Patient,
    Caretaker,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Patient => "patient",
            UserRole::Caretaker => "caretaker",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "patient" => Some(UserRole::Patient),
            "caretaker" | "caregiver" => Some(UserRole::Caretaker),
            _ => None,
        }
    }
}

/// Single-row profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let role: String = row.get("role")?;
        Ok(Self {
            name: row.get("name")?,
            email: row.get("email")?,
            // CHECK constraint keeps this to known values
            role: UserRole::from_str(&role).unwrap_or_default(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get(conn: &Connection) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM profile WHERE id = 1")?;

        let result = stmt.query_row([], Self::from_row);
        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set or update the profile (upsert)
    pub fn set(conn: &Connection, name: &str, email: Option<&str>, role: UserRole) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO profile (id, name, email, role)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                role = excluded.role,
                updated_at = datetime('now')
            "#,
            params![name, email, role.as_str()],
        )?;

        Self::get(conn)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_role_from_str() {
        assert_eq!(UserRole::from_str("Caretaker"), Some(UserRole::Caretaker));
        assert_eq!(UserRole::from_str("patient"), Some(UserRole::Patient));
        assert_eq!(UserRole::from_str("doctor"), None);
    }

    #[test]
    fn test_set_is_upsert() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert!(Profile::get(&conn).unwrap().is_none());
        Profile::set(&conn, "Eleanor Thompson", None, UserRole::Patient).unwrap();
        let updated =
            Profile::set(&conn, "Eleanor Thompson", Some("eleanor@example.com"), UserRole::Caretaker)
                .unwrap();
        assert_eq!(updated.role, UserRole::Caretaker);
        assert_eq!(updated.email.as_deref(), Some("eleanor@example.com"));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM profile", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
