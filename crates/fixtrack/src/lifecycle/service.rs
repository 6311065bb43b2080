//! Job lifecycle orchestration.
//!
//! Single-request, single-tenant operations: read the current job, decide
//! the transition, commit the mutation together with its history and
//! notification intents, then dispatch the outbox best-effort. Timeline
//! reads are derived fresh on every call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info_span;
use uuid::Uuid;

use crate::analytics::{dashboard_summary, DashboardSummary, DateRange};
use crate::config::NotificationConfig;
use crate::db::activity_repo::{self, ActivityRow};
use crate::db::job_repo::{self, JobFilter, JobRow};
use crate::db::outbox_repo::{self, OutboxRow};
use crate::db::status_event_repo::{self, StatusEventRow};
use crate::db::{callback_repo, customer_repo, user_repo, Database};
use crate::error::{Result, ServiceError};
use crate::jobs::status::JobStatus;
use crate::jobs::transition::{plan_transition, AssignmentChange, JobPatch};
use crate::lifecycle::outbox::{self, AssignmentPayload, PickupEmailPayload};
use crate::notify::Notifier;
use crate::timeline::{
    changes_from_events, changes_from_notes, parse_timestamp, reconstruct,
    render_status_change_note, StatusChangeParser, StatusTimelineEntry,
};

/// Input for `create_job`.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub customer_id: String,
    pub equipment: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
}

/// A job as returned over the API boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub business_id: String,
    pub code: String,
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub equipment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: JobStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    fn from_row(row: &JobRow, now: DateTime<Utc>) -> Self {
        Self {
            id: row.id.clone(),
            business_id: row.business_id.clone(),
            code: row.code.clone(),
            customer_id: row.customer_id.clone(),
            assigned_to: row.assigned_to.clone(),
            equipment: row.equipment.clone(),
            description: row.description.clone(),
            status: JobStatus::from_code_lenient(&row.status, &row.id),
            version: row.version,
            created_at: parse_timestamp(&row.created_at, now),
            updated_at: parse_timestamp(&row.updated_at, now),
            completed_at: row
                .completed_at
                .as_deref()
                .map(|at| parse_timestamp(at, now)),
        }
    }
}

/// A job enriched with its current-status dwell time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobWithTimeline {
    #[serde(flatten)]
    pub job: JobRecord,
    pub time_in_status_days: f64,
    pub status_entry_time: DateTime<Utc>,
}

/// One page of a job listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListPage {
    pub jobs: Vec<JobRecord>,
    pub total: u64,
}

/// The lifecycle service.
pub struct JobService {
    db: Database,
    notifier: Arc<dyn Notifier>,
    notifications: NotificationConfig,
    parser: StatusChangeParser,
}

impl JobService {
    pub fn new(
        db: Database,
        notifier: Arc<dyn Notifier>,
        notifications: NotificationConfig,
    ) -> Self {
        Self {
            db,
            notifier,
            notifications,
            parser: StatusChangeParser::new(),
        }
    }

    /// Creates a job in `waiting_assessment` with the next per-tenant code.
    pub fn create_job(&self, business_id: &str, new_job: NewJob) -> Result<JobRecord> {
        let customer_id = new_job.customer_id.trim().to_string();
        if customer_id.is_empty() {
            return Err(ServiceError::Validation {
                field: "customerId",
                message: "a customer is required".to_string(),
            }
            .into());
        }
        let equipment = new_job.equipment.trim().to_string();
        if equipment.is_empty() {
            return Err(ServiceError::Validation {
                field: "equipment",
                message: "an equipment description is required".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let now_s = now.to_rfc3339();
        let business = business_id.to_string();
        let row = self.db.with_tx(|conn| {
            let seq = job_repo::next_seq(conn, &business)?;
            let row = JobRow {
                id: Uuid::new_v4().to_string(),
                business_id: business.clone(),
                seq,
                code: format!("JOB-{:04}", seq),
                customer_id: customer_id.clone(),
                assigned_to: new_job.assigned_to.clone(),
                equipment: equipment.clone(),
                description: new_job.description.clone(),
                status: JobStatus::WaitingAssessment.as_str().to_string(),
                version: 1,
                created_at: now_s.clone(),
                updated_at: now_s.clone(),
                completed_at: None,
            };
            job_repo::insert_with(conn, &row)?;
            activity_repo::append_with(
                conn,
                &ActivityRow {
                    id: Uuid::new_v4().to_string(),
                    business_id: business.clone(),
                    entity_type: "job".to_string(),
                    entity_id: row.id.clone(),
                    kind: activity_repo::kind::JOB_CREATED.to_string(),
                    note: format!("Job {} created", row.code),
                    created_at: now_s.clone(),
                },
            )?;
            Ok(row)
        })?;

        log::info!("Created job {} for business {}", row.code, business_id);
        Ok(JobRecord::from_row(&row, now))
    }

    /// Applies a patch to a job: resolves the transition (including the
    /// auto-advance rule), commits the row update with its history and
    /// notification intents, then dispatches the outbox.
    pub fn update_job(
        &self,
        business_id: &str,
        job_id: &str,
        patch: &JobPatch,
    ) -> Result<JobRecord> {
        let _span = info_span!("job_update", job_id = %job_id, business_id = %business_id)
            .entered();

        let current = job_repo::find_by_id(&self.db, job_id, business_id)?
            .ok_or_else(|| ServiceError::NotFound { id: job_id.to_string() })?;

        if let Some(expected) = patch.expected_version {
            if expected != current.version {
                return Err(ServiceError::Conflict { id: job_id.to_string() }.into());
            }
        }

        let plan = plan_transition(&current, patch);
        if !plan.status_changed && plan.changed_fields.is_empty() {
            log::debug!("Update to job {} changed nothing", current.code);
            return Ok(JobRecord::from_row(&current, Utc::now()));
        }

        let now = Utc::now();
        let now_s = now.to_rfc3339();

        // Dwell time in the status being left, rendered into the note.
        let days_in_previous = if plan.status_changed {
            self.timeline_for(&current, now)?
                .last()
                .map(|entry| entry.duration_days)
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let mut updated = current.clone();
        if let Some(ref customer_id) = patch.customer_id {
            updated.customer_id = customer_id.clone();
        }
        if let Some(ref equipment) = patch.equipment {
            updated.equipment = equipment.clone();
        }
        if let Some(ref description) = patch.description {
            updated.description = description.clone();
        }
        if let Some(ref assigned_to) = patch.assigned_to {
            updated.assigned_to = assigned_to.clone();
        }
        updated.status = plan.new_status.as_str().to_string();
        updated.version = current.version + 1;
        updated.updated_at = now_s.clone();
        if plan.status_changed {
            updated.completed_at = if plan.new_status == JobStatus::Completed {
                Some(now_s.clone())
            } else {
                None
            };
        }

        // Resolve the customer email before the transaction; a missing
        // address skips the intent instead of failing the update.
        let pickup_email = if plan.status_changed
            && plan.new_status == JobStatus::ReadyForPickup
            && self.notifications.ready_for_pickup_email
        {
            self.customer_email(&updated.customer_id, business_id, &updated.code)?
        } else {
            None
        };

        let business = business_id.to_string();
        let committed = self.db.with_tx(|conn| {
            if !job_repo::update_checked(conn, &updated, current.version)? {
                return Ok(false);
            }

            if plan.status_changed {
                status_event_repo::append_with(
                    conn,
                    &StatusEventRow {
                        id: Uuid::new_v4().to_string(),
                        business_id: business.clone(),
                        job_id: updated.id.clone(),
                        from_status: plan.previous_status.as_str().to_string(),
                        to_status: plan.new_status.as_str().to_string(),
                        created_at: now_s.clone(),
                    },
                )?;
                activity_repo::append_with(
                    conn,
                    &ActivityRow {
                        id: Uuid::new_v4().to_string(),
                        business_id: business.clone(),
                        entity_type: "job".to_string(),
                        entity_id: updated.id.clone(),
                        kind: activity_repo::kind::JOB_STATUS_CHANGED.to_string(),
                        note: render_status_change_note(
                            plan.previous_status.label(),
                            plan.new_status.label(),
                            days_in_previous,
                        ),
                        created_at: now_s.clone(),
                    },
                )?;
                if plan.new_status == JobStatus::Completed {
                    activity_repo::append_with(
                        conn,
                        &ActivityRow {
                            id: Uuid::new_v4().to_string(),
                            business_id: business.clone(),
                            entity_type: "job".to_string(),
                            entity_id: updated.id.clone(),
                            kind: activity_repo::kind::JOB_COMPLETED.to_string(),
                            note: format!("Job {} completed", updated.code),
                            created_at: now_s.clone(),
                        },
                    )?;
                }
            }

            if !plan.changed_fields.is_empty() {
                activity_repo::append_with(
                    conn,
                    &ActivityRow {
                        id: Uuid::new_v4().to_string(),
                        business_id: business.clone(),
                        entity_type: "job".to_string(),
                        entity_id: updated.id.clone(),
                        kind: activity_repo::kind::JOB_UPDATED.to_string(),
                        note: format!("Updated {}", plan.changed_fields.join(", ")),
                        created_at: now_s.clone(),
                    },
                )?;
            }

            if self.notifications.assignment_notifications {
                match &plan.assignment {
                    AssignmentChange::Assigned { user_id } => {
                        enqueue(
                            conn,
                            &business,
                            outbox_repo::kind::ASSIGNMENT,
                            &AssignmentPayload {
                                job_id: updated.id.clone(),
                                user_id: user_id.clone(),
                                previous_user_id: None,
                            },
                            &now_s,
                        )?;
                    }
                    AssignmentChange::Reassigned { previous, user_id } => {
                        enqueue(
                            conn,
                            &business,
                            outbox_repo::kind::REASSIGNMENT,
                            &AssignmentPayload {
                                job_id: updated.id.clone(),
                                user_id: user_id.clone(),
                                previous_user_id: Some(previous.clone()),
                            },
                            &now_s,
                        )?;
                    }
                    AssignmentChange::Cleared { .. } | AssignmentChange::None => {}
                }
            }

            if let Some(ref email) = pickup_email {
                enqueue(
                    conn,
                    &business,
                    outbox_repo::kind::READY_FOR_PICKUP_EMAIL,
                    &PickupEmailPayload {
                        job_id: updated.id.clone(),
                        email: email.clone(),
                    },
                    &now_s,
                )?;
            }

            Ok(true)
        })?;

        if !committed {
            // A concurrent writer advanced the version between our read
            // and the update statement.
            return Err(ServiceError::Conflict { id: job_id.to_string() }.into());
        }

        if plan.status_changed {
            log::info!(
                "Job {} moved {} -> {}{}",
                updated.code,
                plan.previous_status,
                plan.new_status,
                if plan.auto_advanced { " (auto)" } else { "" }
            );
        }

        // Committed; everything past this point is best-effort.
        outbox::dispatch_pending(&self.db, self.notifier.as_ref(), business_id);

        Ok(JobRecord::from_row(&updated, now))
    }

    /// Deletes a job. Activity history stays — the log is append-only.
    pub fn delete_job(&self, business_id: &str, job_id: &str) -> Result<()> {
        if !job_repo::delete(&self.db, job_id, business_id)? {
            return Err(ServiceError::NotFound { id: job_id.to_string() }.into());
        }
        log::info!("Deleted job {} from business {}", job_id, business_id);
        Ok(())
    }

    pub fn get_job(&self, business_id: &str, job_id: &str) -> Result<JobRecord> {
        let row = job_repo::find_by_id(&self.db, job_id, business_id)?
            .ok_or_else(|| ServiceError::NotFound { id: job_id.to_string() })?;
        Ok(JobRecord::from_row(&row, Utc::now()))
    }

    pub fn list_jobs(&self, business_id: &str, filter: &JobFilter) -> Result<JobListPage> {
        let now = Utc::now();
        let (rows, total) = job_repo::query(&self.db, business_id, filter)?;
        Ok(JobListPage {
            jobs: rows.iter().map(|row| JobRecord::from_row(row, now)).collect(),
            total,
        })
    }

    /// The job plus how long it has occupied its current status.
    pub fn get_job_with_timeline(
        &self,
        business_id: &str,
        job_id: &str,
    ) -> Result<JobWithTimeline> {
        let row = job_repo::find_by_id(&self.db, job_id, business_id)?
            .ok_or_else(|| ServiceError::NotFound { id: job_id.to_string() })?;
        let now = Utc::now();
        let timeline = self.timeline_for(&row, now)?;
        // Reconstruction always yields at least the current entry.
        let current = timeline.last().expect("timeline is never empty");
        Ok(JobWithTimeline {
            job: JobRecord::from_row(&row, now),
            time_in_status_days: current.duration_days,
            status_entry_time: current.start_time,
        })
    }

    /// Full status timeline, oldest interval first.
    pub fn get_status_timeline(
        &self,
        business_id: &str,
        job_id: &str,
    ) -> Result<Vec<StatusTimelineEntry>> {
        let row = job_repo::find_by_id(&self.db, job_id, business_id)?
            .ok_or_else(|| ServiceError::NotFound { id: job_id.to_string() })?;
        self.timeline_for(&row, Utc::now())
    }

    /// Dashboard aggregation over the tenant's collections.
    pub fn dashboard(&self, business_id: &str, range: DateRange) -> Result<DashboardSummary> {
        let jobs = job_repo::list_all(&self.db, business_id)?;
        let callbacks = callback_repo::list_all(&self.db, business_id)?;
        let customers = customer_repo::list_all(&self.db, business_id)?;
        let users = user_repo::list_all(&self.db, business_id)?;
        Ok(dashboard_summary(
            &jobs,
            &callbacks,
            &customers,
            &users,
            range,
            Utc::now(),
        ))
    }

    /// Structured events are the source of truth; jobs with prose-only
    /// history (predating the events table) fall back to note parsing.
    fn timeline_for(
        &self,
        job: &JobRow,
        now: DateTime<Utc>,
    ) -> Result<Vec<StatusTimelineEntry>> {
        let events = status_event_repo::list_by_job(&self.db, &job.id, &job.business_id)?;
        let changes = if events.is_empty() {
            let notes = activity_repo::list_by_job(&self.db, &job.id, &job.business_id)?;
            changes_from_notes(&self.parser, &notes, now)
        } else {
            changes_from_events(&events, now)
        };
        Ok(reconstruct(
            parse_timestamp(&job.created_at, now),
            &job.status,
            &changes,
            now,
        ))
    }

    fn customer_email(
        &self,
        customer_id: &str,
        business_id: &str,
        job_code: &str,
    ) -> Result<Option<String>> {
        match customer_repo::find_by_id(&self.db, customer_id, business_id)? {
            Some(customer) => match customer.email {
                Some(email) if !email.trim().is_empty() => Ok(Some(email)),
                _ => {
                    log::warn!(
                        "Customer {} has no email; skipping pickup email for job {}",
                        customer_id,
                        job_code
                    );
                    Ok(None)
                }
            },
            None => {
                log::warn!(
                    "Customer {} not found; skipping pickup email for job {}",
                    customer_id,
                    job_code
                );
                Ok(None)
            }
        }
    }
}

fn enqueue<P: Serialize>(
    conn: &rusqlite::Connection,
    business_id: &str,
    kind: &str,
    payload: &P,
    now_s: &str,
) -> std::result::Result<(), crate::db::DatabaseError> {
    let payload = serde_json::to_string(payload).expect("outbox payloads serialize");
    outbox_repo::enqueue_with(
        conn,
        &OutboxRow {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            kind: kind.to_string(),
            payload,
            created_at: now_s.to_string(),
            dispatched_at: None,
            attempts: 0,
            last_error: None,
        },
    )
}
