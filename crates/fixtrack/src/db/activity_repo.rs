//! Activity log repository — append-only domain event notes.
//!
//! Rows are written once and never updated or deleted; status history is
//! derived from them for jobs that predate the `status_events` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// Activity kinds written by the lifecycle service.
pub mod kind {
    pub const JOB_CREATED: &str = "job_created";
    pub const JOB_STATUS_CHANGED: &str = "job_status_changed";
    pub const JOB_COMPLETED: &str = "job_completed";
    pub const JOB_UPDATED: &str = "job_updated";
    pub const NOTE: &str = "note";
}

/// An immutable activity log row.
#[derive(Debug, Clone)]
pub struct ActivityRow {
    pub id: String,
    pub business_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub kind: String,
    pub note: String,
    pub created_at: String,
}

impl ActivityRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            business_id: row.get("business_id")?,
            entity_type: row.get("entity_type")?,
            entity_id: row.get("entity_id")?,
            kind: row.get("kind")?,
            note: row.get("note")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Appends one activity row.
pub fn append(db: &Database, entry: &ActivityRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| append_with(conn, entry))
}

/// Appends one activity row on an already-locked connection.
pub fn append_with(conn: &rusqlite::Connection, entry: &ActivityRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO activity_log (id, business_id, entity_type, entity_id, kind, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.id,
            entry.business_id,
            entry.entity_type,
            entry.entity_id,
            entry.kind,
            entry.note,
            entry.created_at,
        ],
    )?;
    Ok(())
}

/// Lists a job's activity rows in chronological order.
pub fn list_by_job(
    db: &Database,
    job_id: &str,
    business_id: &str,
) -> Result<Vec<ActivityRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM activity_log
             WHERE business_id = ?1 AND entity_type = 'job' AND entity_id = ?2
             ORDER BY created_at, id",
        )?;
        let rows: Vec<ActivityRow> = stmt
            .query_map(params![business_id, job_id], ActivityRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
