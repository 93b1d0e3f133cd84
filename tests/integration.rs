//! End-to-end tests for the attendance engine HTTP API.
//!
//! This suite drives the router with `tower::ServiceExt::oneshot` and covers:
//! - Starting in the office and outside every geofence
//! - Self-report vs biometric mismatches
//! - Auto-closing sessions left open past midnight
//! - Bulk salary runs with a corrupt employee
//! - The progress gate, leave pre-emption and concurrent starts

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower::ServiceExt;

use attendance_engine::api::{ApiError, AppState, LiveAttendanceResponse, create_router};
use attendance_engine::clock::FixedClock;
use attendance_engine::config::ConfigLoader;
use attendance_engine::engine::{AttendanceService, ClosedDay, Collaborators, UploadReport};
use attendance_engine::events::BroadcastEventSink;
use attendance_engine::models::{
    AttendanceSource, BulkSalaryOutcome, DailyAttendanceRecord, DiscrepancyFlag, Employee,
    EventType, LeaveRecord, LeaveStatus, SalaryCalculation, SessionStatus, Severity,
    WorkLocationTag, WorkSession,
};
use attendance_engine::sources::{InMemoryLeave, InMemoryProgress, InMemoryRoster};
use attendance_engine::store::{AttendanceStore, InMemoryStore};

// =============================================================================
// Test Helpers
// =============================================================================

struct Harness {
    router: Router,
    state: AppState,
    clock: Arc<FixedClock>,
    store: Arc<InMemoryStore>,
    leave: Arc<InMemoryLeave>,
    events: Arc<BroadcastEventSink>,
}

fn make_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn make_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn harness_with_roster(roster: InMemoryRoster) -> Harness {
    let config = ConfigLoader::load("./config/default").expect("Failed to load config");
    let clock = Arc::new(FixedClock::new(make_datetime("2026-03-02 09:00:00")));
    let store = Arc::new(InMemoryStore::new());
    let leave = Arc::new(InMemoryLeave::default());
    let events = Arc::new(BroadcastEventSink::default());

    let service = AttendanceService::new(
        config.config().clone(),
        Collaborators {
            store: store.clone(),
            roster: Arc::new(roster),
            leave: leave.clone(),
            progress: Arc::new(InMemoryProgress::new()),
            events: events.clone(),
            clock: clock.clone(),
        },
    );
    let state = AppState::new(service, tokio_util::sync::CancellationToken::new());

    Harness {
        router: create_router(state.clone()),
        state,
        clock,
        store,
        leave,
        events,
    }
}

fn harness() -> Harness {
    harness_with_roster(
        InMemoryRoster::load("./config/default/roster.yaml").expect("Failed to load roster"),
    )
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap_or_else(|err| {
        panic!(
            "unexpected body {}: {}",
            String::from_utf8_lossy(body),
            err
        )
    })
}

fn office_location() -> Value {
    // ~30m from the Dhaka head office
    json!({"latitude": 23.7810, "longitude": 90.4069, "accuracy_m": 12.0})
}

fn far_location() -> Value {
    // ~5km north of the Dhaka head office
    json!({"latitude": 23.8258, "longitude": 90.4067, "accuracy_m": 15.0})
}

async fn start_day(h: &Harness, employee_id: &str, location: Value) -> (StatusCode, Vec<u8>) {
    post_json(
        &h.router,
        "/attendance/start",
        json!({"employee_id": employee_id, "location": location}),
    )
    .await
}

async fn end_day(h: &Harness, employee_id: &str) -> (StatusCode, Vec<u8>) {
    post_json(
        &h.router,
        "/attendance/end",
        json!({"employee_id": employee_id, "location": office_location()}),
    )
    .await
}

async fn submit_progress(h: &Harness, employee_id: &str) {
    let (status, body) = post_json(
        &h.router,
        "/progress",
        json!({"employee_id": employee_id, "achievements": "closed the March ledger"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", String::from_utf8_lossy(&body));
}

fn roster_employee(index: usize) -> Employee {
    Employee {
        id: format!("emp_{:03}", index),
        name: format!("Employee {}", index),
        role: "engineer".to_string(),
        department: "platform".to_string(),
        base_salary: decimal("40000"),
        active: true,
        allowances: vec![],
        deductions: vec![],
    }
}

// =============================================================================
// Scenario A: start inside the office geofence
// =============================================================================

#[tokio::test]
async fn test_scenario_a_office_start_within_radius() {
    let h = harness();

    let (status, body) = start_day(&h, "emp_001", office_location()).await;

    assert_eq!(status, StatusCode::CREATED);
    let session: WorkSession = parse(&body);
    assert_eq!(session.status, SessionStatus::InProgress);
    assert_eq!(session.work_location, WorkLocationTag::Office);
    assert_eq!(session.start_time, Some(make_datetime("2026-03-02 09:00:00")));
    assert!(session.start_location.geofence.within_radius);
    assert_eq!(
        session.start_location.geofence.nearest_site_id.as_deref(),
        Some("dhaka-hq")
    );
}

// =============================================================================
// Scenario B: 5km away without declaring Home or Remote
// =============================================================================

#[tokio::test]
async fn test_scenario_b_far_start_requires_declaration() {
    let h = harness();

    let (status, body) = start_day(&h, "emp_001", far_location()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error: ApiError = parse(&body);
    assert_eq!(error.code, "LOCATION_REQUIRED");
    assert!(error.message.contains("Home or Remote"));

    // Nothing was persisted, so a declared start now succeeds.
    let (status, body) = post_json(
        &h.router,
        "/attendance/start",
        json!({"employee_id": "emp_001", "location": far_location(), "work_location": "remote"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session: WorkSession = parse(&body);
    assert_eq!(session.work_location, WorkLocationTag::Remote);
}

// =============================================================================
// Scenario C: 8.0h self-report vs 6.5h biometric
// =============================================================================

#[tokio::test]
async fn test_scenario_c_self_report_biometric_mismatch() {
    let h = harness();
    let date = make_date("2026-03-02");

    let (status, _) = start_day(&h, "emp_002", office_location()).await;
    assert_eq!(status, StatusCode::CREATED);
    submit_progress(&h, "emp_002").await;
    h.clock.set(make_datetime("2026-03-02 17:00:00"));
    let (status, body) = end_day(&h, "emp_002").await;
    assert_eq!(status, StatusCode::OK);
    let closed: ClosedDay = parse(&body);
    assert_eq!(closed.session.status, SessionStatus::Completed);
    assert_eq!(closed.record.source, AttendanceSource::SelfReport);
    assert!(
        closed
            .record
            .discrepancy_flags
            .contains(&DiscrepancyFlag::NoBiometricPunch)
    );

    let (status, body) = post_json(
        &h.router,
        "/biometric/upload",
        json!({
            "source_file_id": "gate-1-2026-03-02.csv",
            "rows": [
                {"device_id": "gate-1", "badge_id": "1002", "in_time": "2026-03-02 09:00", "out_time": "2026-03-02 15:30"},
                {"device_id": "gate-9", "badge_id": "1002", "in_time": "2026-03-02 09:00", "out_time": "2026-03-02 15:30"}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let report: UploadReport = parse(&body);
    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].row, 1);
    assert!(report.errors.is_empty());

    let record = h
        .store
        .get_record("emp_002", date)
        .await
        .unwrap()
        .unwrap()
        .record;
    assert_eq!(record.source, AttendanceSource::Reconciled);
    assert!(record.is_present);
    assert_eq!(record.hours_worked, decimal("8"));
    assert_eq!(record.biometric_hours, Some(decimal("6.5")));
    assert_eq!(
        record.discrepancy_flags,
        vec![DiscrepancyFlag::SelfReportBiometricMismatch {
            self_report_hours: decimal("8"),
            biometric_hours: decimal("6.5"),
        }]
    );

    // The mismatch surfaces in payroll.
    let (status, body) = post_json(
        &h.router,
        "/salary/calculate",
        json!({"employee_id": "emp_002", "month": 3, "year": 2026, "working_days": 20}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let salary: SalaryCalculation = parse(&body);
    assert_eq!(salary.present_days, 1);
    assert_eq!(salary.attendance_rate, decimal("5"));
    assert_eq!(salary.mismatch_count, 1);
    // 52000 / 20 + transport 1500 + on_call 2000 - provident fund 2600
    assert_eq!(salary.gross_salary, decimal("6100"));
    assert_eq!(salary.net_pay, decimal("3500"));
    assert_eq!(salary.highest_severity(), Some(Severity::High));
    assert_eq!(salary.audit_trace.steps.len(), 7);
}

// =============================================================================
// Scenario D: session left open past midnight
// =============================================================================

#[tokio::test]
async fn test_scenario_d_auto_close_after_midnight() {
    let h = harness();
    let mut events = h.events.subscribe();

    let (status, _) = start_day(&h, "emp_001", office_location()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(events.recv().await.unwrap().event_type, EventType::DayStarted);

    h.clock.set(make_datetime("2026-03-03 00:30:00"));
    let report = h.state.service().auto_closer().sweep().await;
    assert_eq!(report.closed, vec![("emp_001".to_string(), make_date("2026-03-02"))]);
    assert_eq!(events.recv().await.unwrap().event_type, EventType::DayAutoClosed);
    let reconciled = events.recv().await.unwrap();
    assert_eq!(reconciled.event_type, EventType::AttendanceReconciled);
    assert_eq!(reconciled.new_status, SessionStatus::AutoClosed);

    let (status, body) = get(&h.router, "/attendance/live?date=2026-03-02&status=auto_closed").await;
    assert_eq!(status, StatusCode::OK);
    let live: LiveAttendanceResponse = parse(&body);
    assert_eq!(live.entries.len(), 1);
    let entry = &live.entries[0];
    assert_eq!(entry.employee_id, "emp_001");
    assert_eq!(entry.end_time, Some(make_datetime("2026-03-02 23:59:59")));
    assert_eq!(entry.hours_worked, Some(decimal("14.98")));
    assert_eq!(
        entry.discrepancy_flags,
        vec![
            DiscrepancyFlag::AutoClosedNoExplicitEnd,
            DiscrepancyFlag::NoBiometricPunch
        ]
    );

    let record = h
        .store
        .get_record("emp_001", make_date("2026-03-02"))
        .await
        .unwrap()
        .unwrap()
        .record;
    assert!(record.is_present);
    assert_eq!(record.hours_worked, decimal("14.98"));

    // A second sweep finds nothing left to close.
    assert!(h.state.service().auto_closer().sweep().await.closed.is_empty());

    // Ending the auto-closed day is rejected.
    let (status, body) = post_json(
        &h.router,
        "/attendance/end",
        json!({"employee_id": "emp_001", "date": "2026-03-02"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse::<ApiError>(&body).code, "INVALID_TRANSITION");
}

// =============================================================================
// Scenario E: bulk run where the 7th employee has corrupt data
// =============================================================================

#[tokio::test]
async fn test_scenario_e_bulk_run_isolates_corrupt_employee() {
    let roster = InMemoryRoster::new((1..=10).map(roster_employee).collect());
    let h = harness_with_roster(roster);

    h.store
        .put_record(
            DailyAttendanceRecord {
                employee_id: "emp_007".to_string(),
                date: make_date("2026-03-03"),
                is_present: true,
                hours_worked: decimal("30"),
                source: AttendanceSource::SelfReport,
                discrepancy_flags: vec![],
                work_location: Some(WorkLocationTag::Office),
                biometric_hours: None,
            },
            None,
        )
        .await
        .unwrap();

    let (status, body) = post_json(&h.router, "/salary/bulk", json!({"month": 3, "year": 2026})).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: BulkSalaryOutcome = parse(&body);

    assert_eq!(outcome.successes.len(), 9);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].employee_id, "emp_007");
    assert!(outcome.failures[0].error.contains("30"));
    assert!(outcome.not_started.is_empty());
    assert!(!outcome.cancelled);
    assert_eq!(outcome.rerun_ids(), vec!["emp_007".to_string()]);

    let ids: Vec<&str> = outcome
        .successes
        .iter()
        .map(|s| s.employee_id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec![
            "emp_001", "emp_002", "emp_003", "emp_004", "emp_005", "emp_006", "emp_008",
            "emp_009", "emp_010"
        ]
    );
    for success in &outcome.successes {
        assert!(success.net_pay >= Decimal::ZERO);
        assert_eq!(success.working_days, 21);
    }
}

#[tokio::test]
async fn test_bulk_rejects_zero_working_days() {
    let h = harness();

    let (status, body) = post_json(
        &h.router,
        "/salary/bulk",
        json!({"month": 3, "year": 2026, "working_days": 0}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse::<ApiError>(&body).code, "VALIDATION_ERROR");
}

// =============================================================================
// Progress gate
// =============================================================================

#[tokio::test]
async fn test_end_day_blocked_until_progress_logged() {
    let h = harness();
    start_day(&h, "emp_003", office_location()).await;

    let (status, body) = end_day(&h, "emp_003").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse::<ApiError>(&body).code, "PROGRESS_REQUIRED");

    submit_progress(&h, "emp_003").await;
    let (status, _) = end_day(&h, "emp_003").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_progress_logged_before_start_satisfies_gate() {
    let h = harness();
    submit_progress(&h, "emp_001").await;
    start_day(&h, "emp_001", office_location()).await;

    let (status, _) = end_day(&h, "emp_001").await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_blank_progress_is_rejected() {
    let h = harness();

    let (status, body) = post_json(
        &h.router,
        "/progress",
        json!({"employee_id": "emp_001", "notes": "   "}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse::<ApiError>(&body).code, "VALIDATION_ERROR");
}

// =============================================================================
// Lifecycle invariants
// =============================================================================

#[tokio::test]
async fn test_concurrent_starts_have_single_winner() {
    let h = harness();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let router = h.router.clone();
        handles.push(tokio::spawn(async move {
            post_json(
                &router,
                "/attendance/start",
                json!({"employee_id": "emp_001", "location": office_location()}),
            )
            .await
            .0
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_approved_leave_blocks_start() {
    let h = harness();
    h.leave
        .add(LeaveRecord {
            employee_id: "emp_004".to_string(),
            start_date: make_date("2026-03-01"),
            end_date: make_date("2026-03-05"),
            leave_type: "annual".to_string(),
            status: LeaveStatus::Approved,
        })
        .await;

    let (status, body) = start_day(&h, "emp_004", office_location()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse::<ApiError>(&body).code, "ON_LEAVE");

    let (_, body) = get(&h.router, "/attendance/live?status=on_leave").await;
    let live: LiveAttendanceResponse = parse(&body);
    assert_eq!(live.entries.len(), 1);
    assert_eq!(live.entries[0].employee_id, "emp_004");
}

#[tokio::test]
async fn test_unknown_employee_returns_404() {
    let h = harness();

    let (status, body) = start_day(&h, "emp_999", office_location()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse::<ApiError>(&body).code, "EMPLOYEE_NOT_FOUND");
}

#[tokio::test]
async fn test_reconcile_twice_is_idempotent() {
    let h = harness();
    let date = make_date("2026-03-02");
    start_day(&h, "emp_001", office_location()).await;
    submit_progress(&h, "emp_001").await;
    h.clock.set(make_datetime("2026-03-02 18:00:00"));
    end_day(&h, "emp_001").await;

    let before = h.store.get_record("emp_001", date).await.unwrap().unwrap();
    let first = h.state.service().reconcile("emp_001", date).await.unwrap();
    let second = h.state.service().reconcile("emp_001", date).await.unwrap();
    let after = h.store.get_record("emp_001", date).await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(before.version, after.version);
    assert_eq!(first.hours_worked, decimal("9"));
}

#[tokio::test]
async fn test_live_attendance_department_filter() {
    let h = harness();
    start_day(&h, "emp_001", office_location()).await;

    let (status, body) = get(&h.router, "/attendance/live?department=platform").await;

    assert_eq!(status, StatusCode::OK);
    let live: LiveAttendanceResponse = parse(&body);
    assert_eq!(live.date, make_date("2026-03-02"));
    let statuses: Vec<(String, SessionStatus)> = live
        .entries
        .into_iter()
        .map(|e| (e.employee_id, e.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("emp_001".to_string(), SessionStatus::InProgress),
            ("emp_002".to_string(), SessionStatus::NotStarted),
        ]
    );
}
