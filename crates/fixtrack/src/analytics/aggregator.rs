//! Dashboard aggregation.
//!
//! Scans a tenant's flat collections and buckets them into the dashboard
//! summary: status counts, per-assignee callback performance, average
//! repair time, and a trailing 30-day created-vs-completed series.
//! Derivation only — nothing here is persisted.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::db::callback_repo::CallbackRow;
use crate::db::customer_repo::CustomerRow;
use crate::db::job_repo::JobRow;
use crate::db::user_repo::UserRow;
use crate::jobs::status::{label_for_code, JobStatus};
use crate::timeline::parse_timestamp;

const DAILY_WINDOW_DAYS: i64 = 30;

/// Optional inclusive bounds applied to jobs (by creation) and callbacks
/// (by request time) before aggregation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if at > to {
                return false;
            }
        }
        true
    }
}

/// Jobs per status bucket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub label: String,
    pub count: u64,
}

/// Callback performance for one assignee.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeStat {
    pub user_id: String,
    pub name: String,
    pub assigned: u64,
    pub completed: u64,
    /// Percent, two decimals.
    pub completion_rate: f64,
    pub avg_completion_hours: f64,
    pub max_completion_hours: f64,
}

/// Created-vs-completed counts for one day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    /// Day in `YYYY-MM-DD`.
    pub date: String,
    pub created: u64,
    pub completed: u64,
}

/// The assembled dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_jobs: u64,
    pub total_customers: u64,
    pub jobs_by_status: Vec<StatusCount>,
    /// Average `completed_at - created_at` over completed jobs, in days.
    pub avg_repair_time_days: f64,
    pub assignee_stats: Vec<AssigneeStat>,
    pub daily_activity: Vec<DailyActivity>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes the dashboard summary for one tenant's collections.
pub fn dashboard_summary(
    jobs: &[JobRow],
    callbacks: &[CallbackRow],
    customers: &[CustomerRow],
    users: &[UserRow],
    range: DateRange,
    now: DateTime<Utc>,
) -> DashboardSummary {
    let jobs: Vec<&JobRow> = jobs
        .iter()
        .filter(|job| range.contains(parse_timestamp(&job.created_at, now)))
        .collect();
    let callbacks: Vec<&CallbackRow> = callbacks
        .iter()
        .filter(|cb| range.contains(parse_timestamp(&cb.requested_at, now)))
        .collect();

    // Status buckets, in kanban order; buckets outside the fixed set
    // (rows written by newer versions) are appended as-is.
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for job in &jobs {
        *counts.entry(job.status.as_str()).or_default() += 1;
    }
    let mut jobs_by_status: Vec<StatusCount> = JobStatus::all()
        .iter()
        .map(|status| StatusCount {
            status: status.as_str().to_string(),
            label: status.label().to_string(),
            count: counts.remove(status.as_str()).unwrap_or(0),
        })
        .collect();
    let mut leftover: Vec<(&str, u64)> = counts.into_iter().collect();
    leftover.sort();
    for (code, count) in leftover {
        jobs_by_status.push(StatusCount {
            status: code.to_string(),
            label: label_for_code(code),
            count,
        });
    }

    // Average repair time over completed jobs, negatives discarded.
    let repair_days: Vec<f64> = jobs
        .iter()
        .filter_map(|job| {
            let completed_at = job.completed_at.as_deref()?;
            let created = parse_timestamp(&job.created_at, now);
            let completed = parse_timestamp(completed_at, now);
            let days = (completed - created).num_milliseconds() as f64 / 86_400_000.0;
            (days >= 0.0).then_some(days)
        })
        .collect();
    let avg_repair_time_days = if repair_days.is_empty() {
        0.0
    } else {
        round2(repair_days.iter().sum::<f64>() / repair_days.len() as f64)
    };

    let assignee_stats = assignee_stats(&callbacks, users, now);
    let daily_activity = daily_activity(&jobs, now);

    DashboardSummary {
        total_jobs: jobs.len() as u64,
        total_customers: customers.len() as u64,
        jobs_by_status,
        avg_repair_time_days,
        assignee_stats,
        daily_activity,
    }
}

fn assignee_stats(
    callbacks: &[&CallbackRow],
    users: &[UserRow],
    now: DateTime<Utc>,
) -> Vec<AssigneeStat> {
    struct Bucket {
        assigned: u64,
        completed: u64,
        hours: Vec<f64>,
    }

    let mut buckets: HashMap<&str, Bucket> = HashMap::new();
    for cb in callbacks {
        let Some(user_id) = cb.assigned_to.as_deref() else {
            continue;
        };
        let bucket = buckets.entry(user_id).or_insert(Bucket {
            assigned: 0,
            completed: 0,
            hours: Vec::new(),
        });
        bucket.assigned += 1;
        if cb.status == "completed" {
            bucket.completed += 1;
            if let Some(completed_at) = cb.completed_at.as_deref() {
                let requested = parse_timestamp(&cb.requested_at, now);
                let completed = parse_timestamp(completed_at, now);
                let hours = (completed - requested).num_milliseconds() as f64 / 3_600_000.0;
                // Clock or data anomalies can produce negative intervals.
                if hours >= 0.0 {
                    bucket.hours.push(hours);
                }
            }
        }
    }

    let names: HashMap<&str, &str> = users
        .iter()
        .map(|u| (u.id.as_str(), u.name.as_str()))
        .collect();

    let mut stats: Vec<AssigneeStat> = buckets
        .into_iter()
        .map(|(user_id, bucket)| {
            let avg = if bucket.hours.is_empty() {
                0.0
            } else {
                round2(bucket.hours.iter().sum::<f64>() / bucket.hours.len() as f64)
            };
            let max = bucket.hours.iter().cloned().fold(0.0, f64::max);
            AssigneeStat {
                user_id: user_id.to_string(),
                name: names.get(user_id).unwrap_or(&user_id).to_string(),
                assigned: bucket.assigned,
                completed: bucket.completed,
                completion_rate: round2(bucket.completed as f64 / bucket.assigned as f64 * 100.0),
                avg_completion_hours: avg,
                max_completion_hours: round2(max),
            }
        })
        .collect();
    stats.sort_by(|a, b| b.completed.cmp(&a.completed).then(a.name.cmp(&b.name)));
    stats
}

fn daily_activity(jobs: &[&JobRow], now: DateTime<Utc>) -> Vec<DailyActivity> {
    let today = now.date_naive();
    (0..DAILY_WINDOW_DAYS)
        .map(|offset| {
            let day = today - Duration::days(DAILY_WINDOW_DAYS - 1 - offset);
            let created = jobs
                .iter()
                .filter(|job| parse_timestamp(&job.created_at, now).date_naive() == day)
                .count() as u64;
            let completed = jobs
                .iter()
                .filter(|job| {
                    job.completed_at
                        .as_deref()
                        .map(|at| parse_timestamp(at, now).date_naive() == day)
                        .unwrap_or(false)
                })
                .count() as u64;
            DailyActivity {
                date: day.format("%Y-%m-%d").to_string(),
                created,
                completed,
            }
        })
        .collect()
}
