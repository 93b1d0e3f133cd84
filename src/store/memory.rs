//! In-memory [`AttendanceStore`] backed by a single `tokio::sync::RwLock`.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::{AttendanceStore, VersionedRecord, WriteOutcome};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BiometricPunch, DailyAttendanceRecord, PayPeriod, SalaryCalculation, SessionStatus,
    WorkSession,
};

type DayKey = (String, NaiveDate);

#[derive(Debug, Default)]
struct Tables {
    sessions: BTreeMap<DayKey, WorkSession>,
    punches: HashMap<DayKey, Vec<BiometricPunch>>,
    records: BTreeMap<DayKey, VersionedRecord>,
    salaries: HashMap<(String, PayPeriod), SalaryCalculation>,
}

/// Process-local store. Suitable for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(employee_id: &str, date: NaiveDate) -> DayKey {
    (employee_id.to_string(), date)
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn create_session(&self, session: WorkSession) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        let key = key(&session.employee_id, session.date);
        if tables.sessions.contains_key(&key) {
            return Err(EngineError::AlreadyStarted {
                employee_id: session.employee_id,
                date: session.date,
            });
        }
        tables.sessions.insert(key, session);
        Ok(())
    }

    async fn get_session(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<WorkSession>> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.get(&key(employee_id, date)).cloned())
    }

    async fn replace_session(
        &self,
        session: WorkSession,
        expected: SessionStatus,
    ) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        let key = key(&session.employee_id, session.date);
        let Some(stored) = tables.sessions.get_mut(&key) else {
            return Err(EngineError::NotStarted {
                employee_id: session.employee_id,
                date: session.date,
            });
        };
        if stored.status != expected {
            return Err(EngineError::InvalidTransition {
                employee_id: session.employee_id,
                date: session.date,
                from: stored.status,
                to: session.status,
            });
        }
        *stored = session;
        Ok(())
    }

    async fn open_sessions_before(&self, date: NaiveDate) -> EngineResult<Vec<WorkSession>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .values()
            .filter(|s| s.date < date && s.status == SessionStatus::InProgress)
            .cloned()
            .collect())
    }

    async fn sessions_on(&self, date: NaiveDate) -> EngineResult<Vec<WorkSession>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .values()
            .filter(|s| s.date == date)
            .cloned()
            .collect())
    }

    async fn replace_punches(
        &self,
        employee_id: &str,
        date: NaiveDate,
        punches: Vec<BiometricPunch>,
    ) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        tables.punches.insert(key(employee_id, date), punches);
        Ok(())
    }

    async fn punches_for(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<BiometricPunch>> {
        let tables = self.tables.read().await;
        Ok(tables
            .punches
            .get(&key(employee_id, date))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_record(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<VersionedRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.records.get(&key(employee_id, date)).cloned())
    }

    async fn put_record(
        &self,
        record: DailyAttendanceRecord,
        expected_version: Option<u64>,
    ) -> EngineResult<WriteOutcome> {
        let mut tables = self.tables.write().await;
        let key = key(&record.employee_id, record.date);
        let current_version = tables.records.get(&key).map(|r| r.version);
        if current_version != expected_version {
            return Ok(WriteOutcome::Conflict { current_version });
        }
        let version = current_version.unwrap_or(0) + 1;
        tables
            .records
            .insert(key, VersionedRecord { record, version });
        Ok(WriteOutcome::Written { version })
    }

    async fn records_between(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<DailyAttendanceRecord>> {
        if start > end {
            return Ok(Vec::new());
        }
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .range(key(employee_id, start)..=key(employee_id, end))
            .map(|(_, v)| v.record.clone())
            .collect())
    }

    async fn records_on(&self, date: NaiveDate) -> EngineResult<Vec<DailyAttendanceRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .values()
            .filter(|v| v.record.date == date)
            .map(|v| v.record.clone())
            .collect())
    }

    async fn put_salary(&self, calculation: SalaryCalculation) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        tables.salaries.insert(
            (calculation.employee_id.clone(), calculation.period),
            calculation,
        );
        Ok(())
    }

    async fn get_salary(
        &self,
        employee_id: &str,
        period: PayPeriod,
    ) -> EngineResult<Option<SalaryCalculation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .salaries
            .get(&(employee_id.to_string(), period))
            .cloned())
    }
}
