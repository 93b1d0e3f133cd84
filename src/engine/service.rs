//! The attendance service facade.
//!
//! Wires the store, collaborators, clock and event sink into the engine
//! components and exposes the operations the HTTP layer and the binary use.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::auto_close::AutoCloser;
use super::ingest::{BiometricIngestor, UploadReport};
use super::payroll::SalaryCalculator;
use super::progress_gate::ProgressGate;
use super::reconcile::ReconciliationEngine;
use super::session::{ClosedDay, SessionStateMachine};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::EventSink;
use crate::models::{
    BulkSalaryOutcome, Coordinate, DailyAttendanceRecord, DiscrepancyFlag, Employee, PayPeriod,
    ProgressEntry, RawPunchRow, SalaryCalculation, SessionStatus, WorkLocationTag, WorkSession,
};
use crate::sources::{LeaveSource, ProgressTracker, RosterSource};
use crate::store::AttendanceStore;

/// External systems the engine depends on.
#[derive(Clone)]
pub struct Collaborators {
    /// Durable storage.
    pub store: Arc<dyn AttendanceStore>,
    /// Employee roster.
    pub roster: Arc<dyn RosterSource>,
    /// Leave subsystem.
    pub leave: Arc<dyn LeaveSource>,
    /// Progress tracking.
    pub progress: Arc<dyn ProgressTracker>,
    /// State-change event sink.
    pub events: Arc<dyn EventSink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Filters for the live attendance view. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveAttendanceFilter {
    /// Only this department.
    #[serde(default)]
    pub department: Option<String>,
    /// Only this lifecycle state.
    #[serde(default)]
    pub status: Option<SessionStatus>,
    /// Only this work location.
    #[serde(default)]
    pub work_location: Option<WorkLocationTag>,
}

/// One row of the live attendance view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveAttendanceEntry {
    /// The employee.
    pub employee_id: String,
    /// Display name.
    pub name: String,
    /// Department.
    pub department: String,
    /// Current state of the day.
    pub status: SessionStatus,
    /// Where the employee is working, once known.
    pub work_location: Option<WorkLocationTag>,
    /// When the day was started.
    pub start_time: Option<NaiveDateTime>,
    /// When the day was ended.
    pub end_time: Option<NaiveDateTime>,
    /// Hours from the reconciled record, if one exists.
    pub hours_worked: Option<rust_decimal::Decimal>,
    /// Flags from the reconciled record.
    pub discrepancy_flags: Vec<DiscrepancyFlag>,
}

/// Entry point for every attendance and payroll operation.
#[derive(Clone)]
pub struct AttendanceService {
    collaborators: Collaborators,
    config: Arc<EngineConfig>,
    sessions: SessionStateMachine,
    reconciler: ReconciliationEngine,
    ingestor: BiometricIngestor,
    payroll: SalaryCalculator,
}

impl AttendanceService {
    /// Builds the service and its components.
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        let config = Arc::new(config);
        let Collaborators {
            store,
            roster,
            leave,
            progress,
            events,
            clock,
        } = collaborators.clone();

        let reconciler = ReconciliationEngine::new(
            store.clone(),
            leave.clone(),
            events.clone(),
            clock.clone(),
            config.settings().reconciliation.clone(),
        );
        let sessions = SessionStateMachine::new(
            store.clone(),
            leave,
            ProgressGate::new(progress),
            reconciler.clone(),
            events,
            clock.clone(),
            config.clone(),
        );
        let ingestor = BiometricIngestor::new(store.clone(), reconciler.clone(), config.clone());
        let payroll = SalaryCalculator::new(store, roster, clock, config.clone());

        Self {
            collaborators,
            config,
            sessions,
            reconciler,
            ingestor,
            payroll,
        }
    }

    /// The loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A sweep runner sharing this service's components.
    pub fn auto_closer(&self) -> AutoCloser {
        AutoCloser::new(
            self.sessions.clone(),
            self.collaborators.store.clone(),
            self.collaborators.clock.clone(),
            self.config.settings().auto_close.clone(),
        )
    }

    async fn active_employee(&self, employee_id: &str) -> EngineResult<Employee> {
        match self.collaborators.roster.employee(employee_id).await? {
            Some(employee) if employee.active => Ok(employee),
            _ => Err(EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            }),
        }
    }

    /// Today's date according to the service clock.
    pub fn today(&self) -> NaiveDate {
        self.collaborators.clock.today()
    }

    fn date_or_today(&self, date: Option<NaiveDate>) -> NaiveDate {
        date.unwrap_or_else(|| self.today())
    }

    /// Starts the employee's day (today unless `date` is given).
    pub async fn start_day(
        &self,
        employee_id: &str,
        date: Option<NaiveDate>,
        coordinate: Coordinate,
        work_location: Option<WorkLocationTag>,
    ) -> EngineResult<WorkSession> {
        self.active_employee(employee_id).await?;
        let date = self.date_or_today(date);
        self.sessions
            .start(employee_id, date, coordinate, work_location)
            .await
    }

    /// Ends the employee's day (today unless `date` is given).
    pub async fn end_day(
        &self,
        employee_id: &str,
        date: Option<NaiveDate>,
        coordinate: Option<Coordinate>,
    ) -> EngineResult<ClosedDay> {
        self.active_employee(employee_id).await?;
        let date = self.date_or_today(date);
        self.sessions.end(employee_id, date, coordinate).await
    }

    /// Current state of one employee's day.
    pub async fn status(&self, employee_id: &str, date: NaiveDate) -> EngineResult<SessionStatus> {
        self.sessions.status(employee_id, date).await
    }

    /// Records a progress entry for the progress gate.
    pub async fn record_progress(&self, entry: ProgressEntry) -> EngineResult<()> {
        if !entry.has_content() {
            return Err(EngineError::validation(
                "progress",
                "notes, achievements or blockers must be filled in",
            ));
        }
        self.active_employee(&entry.employee_id).await?;
        tracing::info!(
            employee_id = %entry.employee_id,
            date = %entry.date,
            "Progress recorded"
        );
        self.collaborators.progress.submit(entry).await
    }

    /// Live view of every active employee for a date, in roster order.
    pub async fn live_attendance(
        &self,
        date: NaiveDate,
        filter: &LiveAttendanceFilter,
    ) -> EngineResult<Vec<LiveAttendanceEntry>> {
        let employees = self.collaborators.roster.active_employees().await?;
        let mut entries = Vec::new();

        for employee in employees {
            if filter
                .department
                .as_ref()
                .is_some_and(|d| !d.eq_ignore_ascii_case(&employee.department))
            {
                continue;
            }

            let session = self
                .collaborators
                .store
                .get_session(&employee.id, date)
                .await?;
            let status = match &session {
                Some(session) => session.status,
                None => self.sessions.status(&employee.id, date).await?,
            };
            let record: Option<DailyAttendanceRecord> = self
                .collaborators
                .store
                .get_record(&employee.id, date)
                .await?
                .map(|v| v.record);
            let work_location = session
                .as_ref()
                .map(|s| s.work_location)
                .or_else(|| record.as_ref().and_then(|r| r.work_location));

            if filter.status.is_some_and(|s| s != status) {
                continue;
            }
            if filter.work_location.is_some() && filter.work_location != work_location {
                continue;
            }

            entries.push(LiveAttendanceEntry {
                employee_id: employee.id,
                name: employee.name,
                department: employee.department,
                status,
                work_location,
                start_time: session.as_ref().and_then(|s| s.start_time),
                end_time: session.as_ref().and_then(|s| s.end_time),
                hours_worked: record.as_ref().map(|r| r.hours_worked),
                discrepancy_flags: record.map(|r| r.discrepancy_flags).unwrap_or_default(),
            });
        }

        Ok(entries)
    }

    /// Ingests a biometric upload. A source id is generated when none is given.
    pub async fn upload_biometric(
        &self,
        rows: &[RawPunchRow],
        source_file_id: Option<String>,
    ) -> EngineResult<UploadReport> {
        let source_file_id = source_file_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        self.ingestor.upload(rows, &source_file_id).await
    }

    /// Re-runs reconciliation for one key.
    pub async fn reconcile(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<DailyAttendanceRecord> {
        self.reconciler.reconcile(employee_id, date).await
    }

    /// Calculates one employee's salary.
    pub async fn calculate_salary(
        &self,
        employee_id: &str,
        period: PayPeriod,
        working_days: Option<u32>,
    ) -> EngineResult<SalaryCalculation> {
        self.payroll
            .calculate(employee_id, period, working_days)
            .await
    }

    /// Calculates every active employee's salary.
    pub async fn calculate_bulk_salary(
        &self,
        period: PayPeriod,
        working_days: Option<u32>,
        cancel: CancellationToken,
    ) -> EngineResult<BulkSalaryOutcome> {
        self.payroll
            .calculate_bulk(period, working_days, cancel)
            .await
    }
}
