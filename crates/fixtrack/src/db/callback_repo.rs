//! Customer callback request repository (analytics input).

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw callback request row.
#[derive(Debug, Clone)]
pub struct CallbackRow {
    pub id: String,
    pub business_id: String,
    pub customer_id: String,
    pub assigned_to: Option<String>,
    pub status: String,
    pub requested_at: String,
    pub completed_at: Option<String>,
}

impl CallbackRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            business_id: row.get("business_id")?,
            customer_id: row.get("customer_id")?,
            assigned_to: row.get("assigned_to")?,
            status: row.get("status")?,
            requested_at: row.get("requested_at")?,
            completed_at: row.get("completed_at")?,
        })
    }
}

/// Inserts a new callback row.
pub fn insert(db: &Database, callback: &CallbackRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO callbacks (id, business_id, customer_id, assigned_to, status,
             requested_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                callback.id,
                callback.business_id,
                callback.customer_id,
                callback.assigned_to,
                callback.status,
                callback.requested_at,
                callback.completed_at,
            ],
        )?;
        Ok(())
    })
}

/// Marks a callback completed.
pub fn complete(
    db: &Database,
    id: &str,
    business_id: &str,
    completed_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE callbacks SET status = 'completed', completed_at = ?3
             WHERE id = ?1 AND business_id = ?2",
            params![id, business_id, completed_at],
        )?;
        Ok(changed == 1)
    })
}

/// Lists every callback of a tenant.
pub fn list_all(db: &Database, business_id: &str) -> Result<Vec<CallbackRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM callbacks WHERE business_id = ?1 ORDER BY requested_at")?;
        let rows: Vec<CallbackRow> = stmt
            .query_map(params![business_id], CallbackRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
