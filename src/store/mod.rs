//! Persistence for sessions, punches, daily records and salary results.
//!
//! The store is the only shared mutable resource. Every write is a
//! conditional write, so concurrent callers either win atomically or learn
//! that someone else got there first:
//!
//! - [`AttendanceStore::create_session`] is check-and-create per
//!   `(employee_id, date)`.
//! - [`AttendanceStore::replace_session`] only succeeds from the expected
//!   status.
//! - [`AttendanceStore::put_record`] uses optimistic versioning.

mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::EngineResult;
use crate::models::{
    BiometricPunch, DailyAttendanceRecord, PayPeriod, SalaryCalculation, SessionStatus,
    WorkSession,
};

pub use memory::InMemoryStore;

/// A daily record with the version it was stored at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedRecord {
    /// The stored record.
    pub record: DailyAttendanceRecord,
    /// Monotonic version, starting at 1.
    pub version: u64,
}

/// Outcome of a versioned record write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record was stored at this version.
    Written {
        /// The new version.
        version: u64,
    },
    /// Another writer stored a different version first.
    Conflict {
        /// The version currently stored, if any.
        current_version: Option<u64>,
    },
}

/// Keyed durable storage for the engine.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Inserts a new session. Fails with `AlreadyStarted` if one exists for the key.
    async fn create_session(&self, session: WorkSession) -> EngineResult<()>;

    /// Fetches the session for a key.
    async fn get_session(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<WorkSession>>;

    /// Replaces a session if its stored status is still `expected`.
    ///
    /// Fails with `NotStarted` if no session exists and `InvalidTransition`
    /// if the stored status differs.
    async fn replace_session(
        &self,
        session: WorkSession,
        expected: SessionStatus,
    ) -> EngineResult<()>;

    /// In-progress sessions dated strictly before `date`.
    async fn open_sessions_before(&self, date: NaiveDate) -> EngineResult<Vec<WorkSession>>;

    /// All sessions for a date.
    async fn sessions_on(&self, date: NaiveDate) -> EngineResult<Vec<WorkSession>>;

    /// Replaces every punch stored for `(employee_id, date)`.
    async fn replace_punches(
        &self,
        employee_id: &str,
        date: NaiveDate,
        punches: Vec<BiometricPunch>,
    ) -> EngineResult<()>;

    /// Punches for a key, one per device.
    async fn punches_for(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<BiometricPunch>>;

    /// Fetches a daily record with its version.
    async fn get_record(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<VersionedRecord>>;

    /// Stores a record if the stored version still equals `expected_version`
    /// (`None` meaning no record exists yet).
    async fn put_record(
        &self,
        record: DailyAttendanceRecord,
        expected_version: Option<u64>,
    ) -> EngineResult<WriteOutcome>;

    /// An employee's records within `[start, end]`, ordered by date.
    async fn records_between(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<DailyAttendanceRecord>>;

    /// All records for a date.
    async fn records_on(&self, date: NaiveDate) -> EngineResult<Vec<DailyAttendanceRecord>>;

    /// Stores a salary result, superseding any prior one for the same
    /// employee and period.
    async fn put_salary(&self, calculation: SalaryCalculation) -> EngineResult<()>;

    /// Fetches the current salary result for an employee and period.
    async fn get_salary(
        &self,
        employee_id: &str,
        period: PayPeriod,
    ) -> EngineResult<Option<SalaryCalculation>>;
}
