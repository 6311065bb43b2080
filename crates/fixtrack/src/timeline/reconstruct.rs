//! Status timeline reconstruction.
//!
//! Derives, for one job, how long it spent in each status. The result is
//! never persisted: it is recomputed from the current history on every
//! read, so it stays consistent even when history rows were added out of
//! band. Reconstruction is total — bad timestamps degrade to "now" with a
//! warning instead of failing the read.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::activity_repo::ActivityRow;
use crate::db::status_event_repo::StatusEventRow;
use crate::jobs::status::{label_for_code, status_code_for_label};
use crate::timeline::parser::StatusChangeParser;

const MS_PER_DAY: f64 = 86_400_000.0;

/// One derived interval of a job's status history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTimelineEntry {
    /// Status code occupying this interval.
    pub status: String,
    /// Human-readable status label.
    pub label: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Fractional days spent in this interval, clamped to >= 0 and
    /// rounded to two decimals. Open intervals are measured against `now`.
    pub duration_days: f64,
    pub is_current: bool,
}

/// An ordered status change feeding the reconstruction, independent of
/// whether it came from the `status_events` table or from parsed notes.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub from_code: String,
    pub from_label: String,
    pub to_code: String,
    pub to_label: String,
    pub at: DateTime<Utc>,
}

/// Parses an RFC 3339 timestamp, degrading to `fallback` on failure.
pub fn parse_timestamp(s: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("parse_timestamp: failed to parse '{}': {}", s, e);
            fallback
        })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn duration_days(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    // Future-dated history rows (clock skew) clamp to zero.
    let ms = (end - start).num_milliseconds() as f64;
    round2((ms / MS_PER_DAY).max(0.0))
}

/// Converts structured status events into ordered changes.
pub fn changes_from_events(events: &[StatusEventRow], now: DateTime<Utc>) -> Vec<StatusChange> {
    let mut changes: Vec<StatusChange> = events
        .iter()
        .map(|event| StatusChange {
            from_code: event.from_status.clone(),
            from_label: label_for_code(&event.from_status),
            to_code: event.to_status.clone(),
            to_label: label_for_code(&event.to_status),
            at: parse_timestamp(&event.created_at, now),
        })
        .collect();
    changes.sort_by_key(|c| c.at);
    changes
}

/// Converts legacy prose notes into ordered changes. Notes that do not
/// encode a status change are skipped; duplicates are consumed
/// oldest-first in document order (the sort is stable).
pub fn changes_from_notes(
    parser: &StatusChangeParser,
    entries: &[ActivityRow],
    now: DateTime<Utc>,
) -> Vec<StatusChange> {
    let mut changes: Vec<StatusChange> = entries
        .iter()
        .filter_map(|entry| {
            let parsed = parser.parse(&entry.note)?;
            Some(StatusChange {
                from_code: status_code_for_label(&parsed.from_label),
                from_label: parsed.from_label.trim().to_string(),
                to_code: status_code_for_label(&parsed.to_label),
                to_label: parsed.to_label.trim().to_string(),
                at: parse_timestamp(&entry.created_at, now),
            })
        })
        .collect();
    changes.sort_by_key(|c| c.at);
    changes
}

/// Reconstructs the full status timeline of a job.
///
/// With N changes the result has N+1 contiguous entries: one interval per
/// change's `from` state, then an open-ended interval for the job's
/// *current* status (not the last change's `to` — status may have been
/// edited out of band, and the current entry must agree with the job row).
pub fn reconstruct(
    created_at: DateTime<Utc>,
    current_status_code: &str,
    changes: &[StatusChange],
    now: DateTime<Utc>,
) -> Vec<StatusTimelineEntry> {
    let mut entries = Vec::with_capacity(changes.len() + 1);
    let mut cursor = created_at;

    for change in changes {
        entries.push(StatusTimelineEntry {
            status: change.from_code.clone(),
            label: change.from_label.clone(),
            start_time: cursor,
            end_time: Some(change.at),
            duration_days: duration_days(cursor, change.at),
            is_current: false,
        });
        cursor = change.at;
    }

    entries.push(StatusTimelineEntry {
        status: current_status_code.to_string(),
        label: label_for_code(current_status_code),
        start_time: cursor,
        end_time: None,
        duration_days: duration_days(cursor, now),
        is_current: true,
    });

    entries
}
