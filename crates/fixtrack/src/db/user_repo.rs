//! User (staff) repository. Read-mostly; used to enrich activity
//! descriptions and dashboard rows with human-readable names.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw user row.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub email: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            business_id: row.get("business_id")?,
            name: row.get("name")?,
            email: row.get("email")?,
        })
    }
}

/// Inserts a new user row.
pub fn insert(db: &Database, user: &UserRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO users (id, business_id, name, email) VALUES (?1, ?2, ?3, ?4)",
            params![user.id, user.business_id, user.name, user.email],
        )?;
        Ok(())
    })
}

/// Finds a user by id within a tenant.
pub fn find_by_id(
    db: &Database,
    id: &str,
    business_id: &str,
) -> Result<Option<UserRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1 AND business_id = ?2")?;
        let mut rows = stmt.query_map(params![id, business_id], UserRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists every user of a tenant.
pub fn list_all(db: &Database, business_id: &str) -> Result<Vec<UserRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE business_id = ?1 ORDER BY name")?;
        let rows: Vec<UserRow> = stmt
            .query_map(params![business_id], UserRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
