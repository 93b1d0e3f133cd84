//! Performance benchmarks for the attendance engine.
//!
//! Covers the pure reconciliation and salary rules, punch grouping over a
//! large upload, and bulk payroll through the worker pool.
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use attendance_engine::calculation::{
    AttendanceEvidence, PunchEvidence, SalaryInputs, SessionEvidence, compute_salary,
    group_punch_rows, resolve_record,
};
use attendance_engine::clock::FixedClock;
use attendance_engine::config::{ConfigLoader, Device, DeviceRegistry, PayrollPolicy};
use attendance_engine::engine::{AttendanceService, Collaborators};
use attendance_engine::events::BroadcastEventSink;
use attendance_engine::models::{
    AttendanceSource, DailyAttendanceRecord, Employee, PayPeriod, RawPunchRow, WorkLocationTag,
};
use attendance_engine::sources::{InMemoryLeave, InMemoryProgress, InMemoryRoster};
use attendance_engine::store::InMemoryStore;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn employee(index: usize) -> Employee {
    Employee {
        id: format!("emp_bench_{:04}", index),
        name: format!("Bench {}", index),
        role: "engineer".to_string(),
        department: "platform".to_string(),
        base_salary: dec("45000"),
        active: true,
        allowances: vec![],
        deductions: vec![],
    }
}

/// One record per weekday in March 2026, alternating 8h and 9.5h days.
fn month_of_records(employee_id: &str) -> Vec<DailyAttendanceRecord> {
    let period = PayPeriod::new(3, 2026).unwrap();
    period
        .dates()
        .filter(|d| chrono::Datelike::weekday(d).number_from_monday() <= 5)
        .enumerate()
        .map(|(i, date)| DailyAttendanceRecord {
            employee_id: employee_id.to_string(),
            date,
            is_present: true,
            hours_worked: if i % 2 == 0 { dec("8") } else { dec("9.5") },
            source: AttendanceSource::Reconciled,
            discrepancy_flags: vec![],
            work_location: Some(WorkLocationTag::Office),
            biometric_hours: Some(dec("8")),
        })
        .collect()
}

fn bench_resolve_record(c: &mut Criterion) {
    let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let evidence = AttendanceEvidence::Both {
        session: SessionEvidence {
            hours: Some(dec("8")),
            work_location: WorkLocationTag::Office,
            flags: vec![],
        },
        punch: PunchEvidence {
            hours: Some(dec("6.5")),
        },
    };
    let tolerance = dec("0.5");

    c.bench_function("resolve_record_mismatch", |b| {
        b.iter(|| resolve_record(black_box("emp_001"), date, black_box(&evidence), tolerance))
    });
}

fn bench_compute_salary(c: &mut Criterion) {
    let employee = employee(1);
    let records = month_of_records(&employee.id);
    let policy = PayrollPolicy::default();
    let calculated_at = NaiveDateTime::parse_from_str("2026-04-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();

    c.bench_function("compute_salary_full_month", |b| {
        b.iter(|| {
            compute_salary(
                SalaryInputs {
                    employee: black_box(&employee),
                    period: PayPeriod::new(3, 2026).unwrap(),
                    working_days: 22,
                    records: black_box(&records),
                    policy: &policy,
                },
                calculated_at,
            )
            .unwrap()
        })
    });
}

fn bench_group_punch_rows(c: &mut Criterion) {
    let registry = DeviceRegistry::new(vec![Device {
        id: "gate-1".to_string(),
        site_id: None,
        enrollments: (0..200)
            .map(|i| (format!("{}", 1000 + i), format!("emp_bench_{:04}", i)))
            .collect(),
    }]);

    let mut group = c.benchmark_group("punch_grouping");
    for rows_count in [100usize, 1000] {
        let rows: Vec<RawPunchRow> = (0..rows_count)
            .map(|i| RawPunchRow {
                device_id: "gate-1".to_string(),
                badge_id: format!("{}", 1000 + i % 200),
                in_time: format!("2026-03-{:02} 09:00", 2 + (i / 200) % 5),
                out_time: Some(format!("2026-03-{:02} 17:30", 2 + (i / 200) % 5)),
            })
            .collect();

        group.throughput(Throughput::Elements(rows_count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows_count), &rows, |b, rows| {
            b.iter(|| group_punch_rows(black_box(rows), &registry, "bench.csv"))
        });
    }
    group.finish();
}

fn bench_bulk_salary(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let config = ConfigLoader::load("./config/default").expect("Failed to load config");

    let mut group = c.benchmark_group("bulk_salary");
    for employees in [10usize, 100] {
        let service = AttendanceService::new(
            config.config().clone(),
            Collaborators {
                store: Arc::new(InMemoryStore::new()),
                roster: Arc::new(InMemoryRoster::new((0..employees).map(employee).collect())),
                leave: Arc::new(InMemoryLeave::default()),
                progress: Arc::new(InMemoryProgress::new()),
                events: Arc::new(BroadcastEventSink::default()),
                clock: Arc::new(FixedClock::new(
                    NaiveDateTime::parse_from_str("2026-04-01 00:00:00", "%Y-%m-%d %H:%M:%S")
                        .unwrap(),
                )),
            },
        );
        let period = PayPeriod::new(3, 2026).unwrap();

        group.throughput(Throughput::Elements(employees as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(employees),
            &service,
            |b, service| {
                b.to_async(&rt).iter(|| async move {
                    let outcome = service
                        .calculate_bulk_salary(period, None, CancellationToken::new())
                        .await
                        .unwrap();
                    black_box(outcome)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_record,
    bench_compute_salary,
    bench_group_punch_rows,
    bench_bulk_salary,
);
criterion_main!(benches);
