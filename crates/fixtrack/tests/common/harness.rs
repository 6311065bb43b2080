//! Test harness for isolated lifecycle tests.
//!
//! Provides an in-memory database, a `JobService` wired to a recording
//! notifier, and helpers for seeding tenants with customers and users.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fixtrack::config::NotificationConfig;
use fixtrack::db::customer_repo::{self, CustomerRow};
use fixtrack::db::job_repo::JobRow;
use fixtrack::db::user_repo::{self, UserRow};
use fixtrack::db::Database;
use fixtrack::lifecycle::{JobRecord, JobService, NewJob};
use fixtrack::notify::{Notifier, NotifyError};

/// The default tenant used by most tests.
pub const BUSINESS: &str = "biz-1";

/// One recorded notifier invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyCall {
    Assignment {
        job_code: String,
        assignee: String,
    },
    Reassignment {
        job_code: String,
        previous: String,
        assignee: String,
    },
    PickupEmail {
        job_code: String,
        email: String,
    },
}

/// Notifier that records every call and can be told to fail email
/// delivery, for exercising the best-effort policy.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<NotifyCall>>,
    fail_pickup_email: AtomicBool,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pickup_emails(&self) -> Vec<NotifyCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, NotifyCall::PickupEmail { .. }))
            .collect()
    }

    pub fn fail_pickup_email(&self, fail: bool) {
        self.fail_pickup_email.store(fail, Ordering::SeqCst);
    }
}

impl Notifier for RecordingNotifier {
    fn notify_assignment(&self, job: &JobRow, assignee_name: &str) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push(NotifyCall::Assignment {
            job_code: job.code.clone(),
            assignee: assignee_name.to_string(),
        });
        Ok(())
    }

    fn notify_reassignment(
        &self,
        job: &JobRow,
        previous_assignee_name: &str,
        assignee_name: &str,
    ) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push(NotifyCall::Reassignment {
            job_code: job.code.clone(),
            previous: previous_assignee_name.to_string(),
            assignee: assignee_name.to_string(),
        });
        Ok(())
    }

    fn send_ready_for_pickup_email(
        &self,
        customer_email: &str,
        job: &JobRow,
    ) -> Result<(), NotifyError> {
        let call = NotifyCall::PickupEmail {
            job_code: job.code.clone(),
            email: customer_email.to_string(),
        };
        if self.fail_pickup_email.load(Ordering::SeqCst) {
            self.calls.lock().unwrap().push(call);
            return Err(NotifyError::Delivery("smtp unavailable".to_string()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

/// Isolated environment: in-memory database + wired service.
pub struct TestHarness {
    pub db: Database,
    pub service: JobService,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestHarness {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to create test database");
        let notifier = Arc::new(RecordingNotifier::default());
        let service = JobService::new(
            db.clone(),
            notifier.clone(),
            NotificationConfig::default(),
        );
        Self {
            db,
            service,
            notifier,
        }
    }

    /// Seeds a customer into the default tenant.
    pub fn add_customer(&self, id: &str, name: &str, email: Option<&str>) {
        customer_repo::insert(
            &self.db,
            &CustomerRow {
                id: id.to_string(),
                business_id: BUSINESS.to_string(),
                name: name.to_string(),
                email: email.map(str::to_string),
                phone: None,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .expect("Failed to insert customer");
    }

    /// Seeds a user into the default tenant.
    pub fn add_user(&self, id: &str, name: &str) {
        user_repo::insert(
            &self.db,
            &UserRow {
                id: id.to_string(),
                business_id: BUSINESS.to_string(),
                name: name.to_string(),
                email: format!("{}@shop.example", id),
            },
        )
        .expect("Failed to insert user");
    }

    /// Creates a job for `customer_id` in the default tenant.
    pub fn create_job(&self, customer_id: &str) -> JobRecord {
        self.service
            .create_job(
                BUSINESS,
                NewJob {
                    customer_id: customer_id.to_string(),
                    equipment: "MacBook Air M2".to_string(),
                    description: Some("Does not boot".to_string()),
                    assigned_to: None,
                },
            )
            .expect("Failed to create job")
    }
}
