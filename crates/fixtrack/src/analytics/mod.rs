//! Dashboard analytics derived from flat collections.

pub mod aggregator;

pub use aggregator::{
    dashboard_summary, AssigneeStat, DailyActivity, DashboardSummary, DateRange, StatusCount,
};
