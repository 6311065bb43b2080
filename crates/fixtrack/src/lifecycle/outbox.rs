//! Outbox dispatch.
//!
//! Notification intents are committed together with the state mutation;
//! this module delivers them afterwards. A failed delivery is recorded on
//! the row and logged — the mutation it belongs to is already committed
//! and stays committed.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{job_repo, outbox_repo, user_repo, Database};
use crate::notify::Notifier;

/// Payload for `assignment` and `reassignment` rows.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPayload {
    pub job_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_user_id: Option<String>,
}

/// Payload for `ready_for_pickup_email` rows.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupEmailPayload {
    pub job_id: String,
    pub email: String,
}

/// Delivers every pending outbox row of a tenant. Each row is attempted
/// independently; failures never stop the rest of the batch.
pub fn dispatch_pending(db: &Database, notifier: &dyn Notifier, business_id: &str) {
    let pending = match outbox_repo::list_pending(db, business_id) {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Failed to read outbox for {}: {}", business_id, e);
            return;
        }
    };

    for row in pending {
        match deliver(db, notifier, &row) {
            Ok(()) => {
                let now = Utc::now().to_rfc3339();
                if let Err(e) = outbox_repo::mark_dispatched(db, &row.id, &now) {
                    log::error!("Failed to mark outbox row {} dispatched: {}", row.id, e);
                }
            }
            Err(reason) => {
                log::warn!(
                    "Outbox delivery failed for {} row {}: {}",
                    row.kind,
                    row.id,
                    reason
                );
                if let Err(e) = outbox_repo::mark_failed(db, &row.id, &reason) {
                    log::error!("Failed to record outbox failure for {}: {}", row.id, e);
                }
            }
        }
    }
}

fn deliver(
    db: &Database,
    notifier: &dyn Notifier,
    row: &outbox_repo::OutboxRow,
) -> Result<(), String> {
    match row.kind.as_str() {
        outbox_repo::kind::ASSIGNMENT => {
            let payload: AssignmentPayload =
                serde_json::from_str(&row.payload).map_err(|e| e.to_string())?;
            let job = load_job(db, &payload.job_id, &row.business_id)?;
            let name = user_name(db, &payload.user_id, &row.business_id);
            notifier
                .notify_assignment(&job, &name)
                .map_err(|e| e.to_string())
        }
        outbox_repo::kind::REASSIGNMENT => {
            let payload: AssignmentPayload =
                serde_json::from_str(&row.payload).map_err(|e| e.to_string())?;
            let job = load_job(db, &payload.job_id, &row.business_id)?;
            let previous = payload
                .previous_user_id
                .as_deref()
                .map(|id| user_name(db, id, &row.business_id))
                .unwrap_or_else(|| "unassigned".to_string());
            let name = user_name(db, &payload.user_id, &row.business_id);
            notifier
                .notify_reassignment(&job, &previous, &name)
                .map_err(|e| e.to_string())
        }
        outbox_repo::kind::READY_FOR_PICKUP_EMAIL => {
            let payload: PickupEmailPayload =
                serde_json::from_str(&row.payload).map_err(|e| e.to_string())?;
            let job = load_job(db, &payload.job_id, &row.business_id)?;
            notifier
                .send_ready_for_pickup_email(&payload.email, &job)
                .map_err(|e| e.to_string())
        }
        other => Err(format!("unknown outbox kind '{}'", other)),
    }
}

fn load_job(
    db: &Database,
    job_id: &str,
    business_id: &str,
) -> Result<job_repo::JobRow, String> {
    job_repo::find_by_id(db, job_id, business_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("job {} no longer exists", job_id))
}

/// Falls back to the raw id when the user row is gone; a stale name is
/// better than a dropped notification.
fn user_name(db: &Database, user_id: &str, business_id: &str) -> String {
    match user_repo::find_by_id(db, user_id, business_id) {
        Ok(Some(user)) => user.name,
        Ok(None) => user_id.to_string(),
        Err(e) => {
            log::warn!("Failed to load user {}: {}", user_id, e);
            user_id.to_string()
        }
    }
}
