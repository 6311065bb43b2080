pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod lifecycle;
pub mod notify;
pub mod timeline;

pub use analytics::{DashboardSummary, DateRange};
pub use config::{load_config, AppConfig, NotificationConfig};
pub use db::Database;
pub use error::{ConfigError, FixtrackError, Result, ServiceError};
pub use jobs::{JobPatch, JobStatus};
pub use lifecycle::{JobRecord, JobService, JobWithTimeline, NewJob};
pub use notify::{LogNotifier, Notifier};
pub use timeline::{StatusChangeParser, StatusTimelineEntry};
