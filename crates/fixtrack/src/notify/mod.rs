//! Notification collaborator seam.
//!
//! Delivery (email transport, push, SMS) lives outside this crate. The
//! lifecycle service records intents in the outbox and hands them to a
//! `Notifier`; a failed call is recorded and retried later, never
//! surfaced to the caller.

use thiserror::Error;

use crate::db::job_repo::JobRow;

/// Errors from a notification backend.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// External notification collaborator.
pub trait Notifier: Send + Sync {
    /// A previously unassigned job was assigned.
    fn notify_assignment(&self, job: &JobRow, assignee_name: &str) -> Result<(), NotifyError>;

    /// A job moved from one assignee to another.
    fn notify_reassignment(
        &self,
        job: &JobRow,
        previous_assignee_name: &str,
        assignee_name: &str,
    ) -> Result<(), NotifyError>;

    /// A job entered ready-for-pickup; tell the customer.
    fn send_ready_for_pickup_email(
        &self,
        customer_email: &str,
        job: &JobRow,
    ) -> Result<(), NotifyError>;
}

/// Default notifier: writes log lines instead of delivering anything.
/// Useful for development and for deployments without a mail backend.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_assignment(&self, job: &JobRow, assignee_name: &str) -> Result<(), NotifyError> {
        log::info!("Job {} assigned to {}", job.code, assignee_name);
        Ok(())
    }

    fn notify_reassignment(
        &self,
        job: &JobRow,
        previous_assignee_name: &str,
        assignee_name: &str,
    ) -> Result<(), NotifyError> {
        log::info!(
            "Job {} reassigned from {} to {}",
            job.code,
            previous_assignee_name,
            assignee_name
        );
        Ok(())
    }

    fn send_ready_for_pickup_email(
        &self,
        customer_email: &str,
        job: &JobRow,
    ) -> Result<(), NotifyError> {
        log::info!(
            "Ready-for-pickup email for job {} to {}",
            job.code,
            customer_email
        );
        Ok(())
    }
}
