//! Transition planning for job updates.
//!
//! Pure: compares the stored job row against an incoming patch and decides
//! the effective status, the assignment change, and which other fields
//! moved. The lifecycle service executes the plan (row update, history,
//! notifications); nothing here touches storage.

use crate::db::job_repo::JobRow;
use crate::jobs::status::JobStatus;

/// Partial update for a job. `None` fields are untouched. Two-level
/// options distinguish "leave as is" from "set to NULL".
#[derive(Debug, Default, Clone)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub assigned_to: Option<Option<String>>,
    pub customer_id: Option<String>,
    pub equipment: Option<String>,
    pub description: Option<Option<String>>,
    /// Optimistic concurrency check: reject the update when the stored
    /// version differs.
    pub expected_version: Option<i64>,
}

/// How the patch moves `assigned_to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentChange {
    None,
    Assigned { user_id: String },
    Reassigned { previous: String, user_id: String },
    Cleared { previous: String },
}

/// The decided outcome of applying a patch.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub previous_status: JobStatus,
    pub new_status: JobStatus,
    pub status_changed: bool,
    /// True when the status move came from the auto-advance rule rather
    /// than an explicit operator choice.
    pub auto_advanced: bool,
    pub assignment: AssignmentChange,
    /// Non-status fields the patch changes, for the generic update note.
    pub changed_fields: Vec<&'static str>,
}

/// Statuses the auto-advance rule must not regress. Assigning a job that
/// is already being worked on, waiting for pickup, or closed changes
/// ownership only.
fn auto_advance_exempt(status: JobStatus) -> bool {
    matches!(
        status,
        JobStatus::InProgress | JobStatus::ReadyForPickup | JobStatus::Completed
    )
}

/// Decides what an update does before anything is written.
pub fn plan_transition(current: &JobRow, patch: &JobPatch) -> TransitionPlan {
    let previous_status = JobStatus::from_code_lenient(&current.status, &current.id);

    let assignment = match &patch.assigned_to {
        None => AssignmentChange::None,
        Some(next) => match (current.assigned_to.as_deref(), next.as_deref()) {
            (None, Some(user)) => AssignmentChange::Assigned {
                user_id: user.to_string(),
            },
            (Some(prev), Some(user)) if prev != user => AssignmentChange::Reassigned {
                previous: prev.to_string(),
                user_id: user.to_string(),
            },
            (Some(prev), None) => AssignmentChange::Cleared {
                previous: prev.to_string(),
            },
            _ => AssignmentChange::None,
        },
    };

    // Work begins when someone takes ownership: assigning a previously
    // unassigned job, with no explicit status in the same patch, starts it
    // unless the job is already further along.
    let mut auto_advanced = false;
    let new_status = match patch.status {
        Some(explicit) => explicit,
        None => {
            if matches!(assignment, AssignmentChange::Assigned { .. })
                && !auto_advance_exempt(previous_status)
            {
                auto_advanced = true;
                JobStatus::InProgress
            } else {
                previous_status
            }
        }
    };

    let mut changed_fields = Vec::new();
    if let Some(ref customer_id) = patch.customer_id {
        if *customer_id != current.customer_id {
            changed_fields.push("customer");
        }
    }
    if let Some(ref equipment) = patch.equipment {
        if *equipment != current.equipment {
            changed_fields.push("equipment");
        }
    }
    if let Some(ref description) = patch.description {
        if *description != current.description {
            changed_fields.push("description");
        }
    }
    if assignment != AssignmentChange::None {
        changed_fields.push("assignee");
    }

    TransitionPlan {
        previous_status,
        new_status,
        status_changed: new_status != previous_status,
        auto_advanced,
        assignment,
        changed_fields,
    }
}
