//! Job status vocabulary and transition graph.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operational status of a repair job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Intake state for new jobs.
    WaitingAssessment,
    /// Work has started.
    InProgress,
    /// Work paused (waiting on parts, customer approval, ...).
    OnHold,
    /// Repair finished, customer not yet notified/arrived.
    ReadyForPickup,
    /// Picked up and closed.
    Completed,
    /// Closed without completion. Terminal; never produced by the
    /// modeled transitions.
    Cancelled,
}

impl JobStatus {
    /// Storage code used in the database and over the API boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::WaitingAssessment => "waiting_assessment",
            JobStatus::InProgress => "in_progress",
            JobStatus::OnHold => "on_hold",
            JobStatus::ReadyForPickup => "ready_for_pickup",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Human-readable label used in activity notes and receipts.
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::WaitingAssessment => "Waiting Assessment",
            JobStatus::InProgress => "In Progress",
            JobStatus::OnHold => "On Hold",
            JobStatus::ReadyForPickup => "Ready for Pickup",
            JobStatus::Completed => "Completed",
            JobStatus::Cancelled => "Cancelled",
        }
    }

    /// Parses a storage code. Returns `None` for unknown codes.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "waiting_assessment" => Some(JobStatus::WaitingAssessment),
            "in_progress" => Some(JobStatus::InProgress),
            "on_hold" => Some(JobStatus::OnHold),
            "ready_for_pickup" => Some(JobStatus::ReadyForPickup),
            "completed" => Some(JobStatus::Completed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    /// Parses a storage code leniently, defaulting to `WaitingAssessment`
    /// for unknown values. Rows written by newer versions must not make
    /// reads fail.
    pub fn from_code_lenient(code: &str, job_id: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            log::warn!(
                "Unknown job status '{}' for job {}, defaulting to WaitingAssessment",
                code,
                job_id
            );
            JobStatus::WaitingAssessment
        })
    }

    /// Resolves a free-text status label by case-insensitive substring
    /// matching against the fixed vocabulary. Returns `None` for labels
    /// outside it.
    pub fn match_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        if lower.contains("waiting assessment") {
            Some(JobStatus::WaitingAssessment)
        } else if lower.contains("in progress") {
            Some(JobStatus::InProgress)
        } else if lower.contains("on hold") {
            Some(JobStatus::OnHold)
        } else if lower.contains("ready for pickup") {
            Some(JobStatus::ReadyForPickup)
        } else if lower.contains("completed") {
            Some(JobStatus::Completed)
        } else {
            None
        }
    }

    /// Statuses reachable from this one via the modeled transitions.
    /// Informational (kanban columns); an explicit operator choice is
    /// always honored.
    pub fn next_statuses(&self) -> &'static [JobStatus] {
        match self {
            JobStatus::WaitingAssessment => &[JobStatus::InProgress],
            JobStatus::InProgress => &[
                JobStatus::OnHold,
                JobStatus::ReadyForPickup,
                JobStatus::Completed,
            ],
            JobStatus::OnHold => &[JobStatus::InProgress, JobStatus::Completed],
            JobStatus::ReadyForPickup => &[JobStatus::InProgress, JobStatus::Completed],
            JobStatus::Completed => &[],
            JobStatus::Cancelled => &[],
        }
    }

    /// Returns true for closed states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    /// All statuses, in kanban column order.
    pub fn all() -> &'static [JobStatus] {
        &[
            JobStatus::WaitingAssessment,
            JobStatus::InProgress,
            JobStatus::OnHold,
            JobStatus::ReadyForPickup,
            JobStatus::Completed,
            JobStatus::Cancelled,
        ]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalizes a status label into a storage-code-shaped slug:
/// lowercase, whitespace runs collapsed to single underscores.
pub fn slugify_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Resolves a free-text label to a status code. Labels outside the fixed
/// vocabulary fall back to their normalized slug so future statuses flow
/// through unchanged.
pub fn status_code_for_label(label: &str) -> String {
    match JobStatus::match_label(label) {
        Some(status) => status.as_str().to_string(),
        None => slugify_label(label),
    }
}

/// Human-readable label for a status code, including codes outside the
/// fixed vocabulary (slug rendered as-is).
pub fn label_for_code(code: &str) -> String {
    match JobStatus::from_code(code) {
        Some(status) => status.label().to_string(),
        None => code.to_string(),
    }
}
