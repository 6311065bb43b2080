//! Outbox repository — notification intents recorded in the same
//! transaction as the state mutation, delivered afterwards.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// Outbox kinds the dispatcher understands.
pub mod kind {
    pub const ASSIGNMENT: &str = "assignment";
    pub const REASSIGNMENT: &str = "reassignment";
    pub const READY_FOR_PICKUP_EMAIL: &str = "ready_for_pickup_email";
}

/// A pending or dispatched outbox row.
#[derive(Debug, Clone)]
pub struct OutboxRow {
    pub id: String,
    pub business_id: String,
    pub kind: String,
    pub payload: String,
    pub created_at: String,
    pub dispatched_at: Option<String>,
    pub attempts: i64,
    pub last_error: Option<String>,
}

impl OutboxRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            business_id: row.get("business_id")?,
            kind: row.get("kind")?,
            payload: row.get("payload")?,
            created_at: row.get("created_at")?,
            dispatched_at: row.get("dispatched_at")?,
            attempts: row.get("attempts")?,
            last_error: row.get("last_error")?,
        })
    }
}

/// Enqueues one outbox row on an already-locked connection.
pub fn enqueue_with(conn: &rusqlite::Connection, row: &OutboxRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO outbox (id, business_id, kind, payload, created_at, dispatched_at,
         attempts, last_error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            row.id,
            row.business_id,
            row.kind,
            row.payload,
            row.created_at,
            row.dispatched_at,
            row.attempts,
            row.last_error,
        ],
    )?;
    Ok(())
}

/// Lists undelivered rows of a tenant in enqueue order.
pub fn list_pending(db: &Database, business_id: &str) -> Result<Vec<OutboxRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM outbox
             WHERE business_id = ?1 AND dispatched_at IS NULL
             ORDER BY created_at, id",
        )?;
        let rows: Vec<OutboxRow> = stmt
            .query_map(params![business_id], OutboxRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Marks a row delivered.
pub fn mark_dispatched(
    db: &Database,
    id: &str,
    dispatched_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE outbox SET dispatched_at = ?2, attempts = attempts + 1, last_error = NULL
             WHERE id = ?1",
            params![id, dispatched_at],
        )?;
        Ok(())
    })
}

/// Records a failed delivery attempt. The row stays pending.
pub fn mark_failed(db: &Database, id: &str, error: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE outbox SET attempts = attempts + 1, last_error = ?2 WHERE id = ?1",
            params![id, error],
        )?;
        Ok(())
    })
}
