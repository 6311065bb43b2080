//! Timeline reads through the service, including the legacy prose-note
//! fallback for jobs without structured status events.

mod common;

use common::builders::PatchBuilder;
use common::harness::{TestHarness, BUSINESS};
use fixtrack::db::activity_repo::{self, ActivityRow};
use fixtrack::db::job_repo::{self, JobRow};
use fixtrack::jobs::JobStatus;

/// Inserts a job row directly, bypassing the service — the shape of data
/// imported from the system that predates structured status events.
fn insert_legacy_job(h: &TestHarness, id: &str, status: &str, created_at: &str) {
    job_repo::insert(
        &h.db,
        &JobRow {
            id: id.to_string(),
            business_id: BUSINESS.to_string(),
            seq: 900,
            code: "JOB-0900".to_string(),
            customer_id: "cust-1".to_string(),
            assigned_to: None,
            equipment: "Sony WH-1000XM4".to_string(),
            description: None,
            status: status.to_string(),
            version: 1,
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
            completed_at: None,
        },
    )
    .unwrap();
}

fn append_note(h: &TestHarness, id: &str, job_id: &str, note: &str, created_at: &str) {
    activity_repo::append(
        &h.db,
        &ActivityRow {
            id: id.to_string(),
            business_id: BUSINESS.to_string(),
            entity_type: "job".to_string(),
            entity_id: job_id.to_string(),
            kind: activity_repo::kind::NOTE.to_string(),
            note: note.to_string(),
            created_at: created_at.to_string(),
        },
    )
    .unwrap();
}

#[test]
fn new_job_has_single_open_entry() {
    let h = TestHarness::new();
    h.add_customer("cust-1", "Dana Reyes", None);
    let job = h.create_job("cust-1");

    let timeline = h.service.get_status_timeline(BUSINESS, &job.id).unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].status, "waiting_assessment");
    assert_eq!(timeline[0].label, "Waiting Assessment");
    assert_eq!(timeline[0].start_time, job.created_at);
    assert!(timeline[0].end_time.is_none());
    assert!(timeline[0].is_current);
}

#[test]
fn n_transitions_yield_n_plus_one_contiguous_entries() {
    let h = TestHarness::new();
    h.add_customer("cust-1", "Dana Reyes", None);
    let job = h.create_job("cust-1");

    for status in [JobStatus::InProgress, JobStatus::OnHold, JobStatus::Completed] {
        h.service
            .update_job(BUSINESS, &job.id, &PatchBuilder::new().status(status).build())
            .unwrap();
    }

    let timeline = h.service.get_status_timeline(BUSINESS, &job.id).unwrap();
    assert_eq!(timeline.len(), 4);
    for pair in timeline.windows(2) {
        assert_eq!(pair[0].end_time, Some(pair[1].start_time));
    }
    assert_eq!(timeline.iter().filter(|e| e.is_current).count(), 1);
    assert!(timeline.last().unwrap().is_current);
}

#[test]
fn timeline_read_is_idempotent() {
    let h = TestHarness::new();
    h.add_customer("cust-1", "Dana Reyes", None);
    let job = h.create_job("cust-1");
    h.service
        .update_job(
            BUSINESS,
            &job.id,
            &PatchBuilder::new().status(JobStatus::InProgress).build(),
        )
        .unwrap();

    let first = h.service.get_status_timeline(BUSINESS, &job.id).unwrap();
    let second = h.service.get_status_timeline(BUSINESS, &job.id).unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.status, b.status);
        assert_eq!(a.start_time, b.start_time);
        assert_eq!(a.end_time, b.end_time);
        assert_eq!(a.is_current, b.is_current);
    }
}

#[test]
fn job_with_timeline_reports_current_dwell() {
    let h = TestHarness::new();
    h.add_customer("cust-1", "Dana Reyes", None);
    let job = h.create_job("cust-1");
    h.service
        .update_job(
            BUSINESS,
            &job.id,
            &PatchBuilder::new().status(JobStatus::InProgress).build(),
        )
        .unwrap();

    let enriched = h.service.get_job_with_timeline(BUSINESS, &job.id).unwrap();
    assert_eq!(enriched.job.status, JobStatus::InProgress);
    // Entered the current status moments ago.
    assert_eq!(enriched.time_in_status_days, 0.0);
    assert!(enriched.status_entry_time >= job.created_at);
}

#[test]
fn legacy_job_timeline_is_parsed_from_notes() {
    let h = TestHarness::new();
    insert_legacy_job(&h, "legacy-1", "on_hold", "2026-01-01T00:00:00Z");
    append_note(&h, "n1", "legacy-1", "Job JOB-0900 created", "2026-01-01T00:00:00Z");
    append_note(
        &h,
        "n2",
        "legacy-1",
        "Status changed from \"Waiting Assessment\" to \"In Progress\" (1.00 days in previous status)",
        "2026-01-02T00:00:00Z",
    );
    append_note(
        &h,
        "n3",
        "legacy-1",
        "Status changed from \"In Progress\" to \"On Hold\"",
        "2026-01-04T00:00:00Z",
    );

    let timeline = h.service.get_status_timeline(BUSINESS, "legacy-1").unwrap();
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline[0].status, "waiting_assessment");
    assert_eq!(timeline[0].duration_days, 1.0);
    assert_eq!(timeline[1].status, "in_progress");
    assert_eq!(timeline[1].duration_days, 2.0);
    assert_eq!(timeline[2].status, "on_hold");
    assert!(timeline[2].is_current);
}

#[test]
fn malformed_legacy_notes_are_ignored() {
    let h = TestHarness::new();
    insert_legacy_job(&h, "legacy-2", "waiting_assessment", "2026-01-01T00:00:00Z");
    append_note(&h, "n1", "legacy-2", "Status changed from X to", "2026-01-02T00:00:00Z");
    append_note(
        &h,
        "n2",
        "legacy-2",
        "Status changed from \"Waiting Assessment to In Progress",
        "2026-01-03T00:00:00Z",
    );

    let timeline = h.service.get_status_timeline(BUSINESS, "legacy-2").unwrap();
    // No parseable change: a single entry since creation.
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].status, "waiting_assessment");
    assert!(timeline[0].is_current);
}

#[test]
fn legacy_unknown_label_falls_back_to_slug() {
    let h = TestHarness::new();
    insert_legacy_job(&h, "legacy-3", "in_progress", "2026-01-01T00:00:00Z");
    append_note(
        &h,
        "n1",
        "legacy-3",
        "Status changed from \"Awaiting Parts\" to \"In Progress\"",
        "2026-01-03T00:00:00Z",
    );

    let timeline = h.service.get_status_timeline(BUSINESS, "legacy-3").unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].status, "awaiting_parts");
    assert_eq!(timeline[0].label, "Awaiting Parts");
    assert_eq!(timeline[1].status, "in_progress");
}

#[test]
fn structured_events_take_precedence_over_notes() {
    let h = TestHarness::new();
    h.add_customer("cust-1", "Dana Reyes", None);
    let job = h.create_job("cust-1");
    h.service
        .update_job(
            BUSINESS,
            &job.id,
            &PatchBuilder::new().status(JobStatus::InProgress).build(),
        )
        .unwrap();

    // A stray prose note added out of band must not duplicate the
    // structured event.
    append_note(
        &h,
        "stray",
        &job.id,
        "Status changed from \"In Progress\" to \"On Hold\"",
        "2026-02-01T00:00:00Z",
    );

    let timeline = h.service.get_status_timeline(BUSINESS, &job.id).unwrap();
    assert_eq!(timeline.len(), 2);
}

#[test]
fn timeline_for_unknown_job_is_not_found() {
    let h = TestHarness::new();
    let err = h.service.get_status_timeline(BUSINESS, "ghost").unwrap_err();
    assert!(matches!(
        err,
        fixtrack::FixtrackError::Service(fixtrack::ServiceError::NotFound { .. })
    ));
}
