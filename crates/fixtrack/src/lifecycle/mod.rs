//! Job lifecycle orchestration: the service surface and the outbox
//! dispatcher behind it.

pub mod outbox;
pub mod service;

pub use service::{JobListPage, JobRecord, JobService, JobWithTimeline, NewJob};
