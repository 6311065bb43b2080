//! Status event repository — the append-only source of truth for job
//! status history. One row per effective transition.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A recorded status transition.
#[derive(Debug, Clone)]
pub struct StatusEventRow {
    pub id: String,
    pub business_id: String,
    pub job_id: String,
    pub from_status: String,
    pub to_status: String,
    pub created_at: String,
}

impl StatusEventRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            business_id: row.get("business_id")?,
            job_id: row.get("job_id")?,
            from_status: row.get("from_status")?,
            to_status: row.get("to_status")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Appends one status event on an already-locked connection.
pub fn append_with(
    conn: &rusqlite::Connection,
    event: &StatusEventRow,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO status_events (id, business_id, job_id, from_status, to_status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.id,
            event.business_id,
            event.job_id,
            event.from_status,
            event.to_status,
            event.created_at,
        ],
    )?;
    Ok(())
}

/// Lists a job's status events in chronological order.
pub fn list_by_job(
    db: &Database,
    job_id: &str,
    business_id: &str,
) -> Result<Vec<StatusEventRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM status_events
             WHERE business_id = ?1 AND job_id = ?2
             ORDER BY created_at, id",
        )?;
        let rows: Vec<StatusEventRow> = stmt
            .query_map(params![business_id, job_id], StatusEventRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns the latest status event for a job, if any.
pub fn latest_for_job(
    db: &Database,
    job_id: &str,
    business_id: &str,
) -> Result<Option<StatusEventRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM status_events
             WHERE business_id = ?1 AND job_id = ?2
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![business_id, job_id], StatusEventRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}
