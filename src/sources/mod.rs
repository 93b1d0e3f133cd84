//! Collaborator seams: roster, leave and progress tracking.
//!
//! The engine only reads from these subsystems (progress intake aside).
//! Each is an async trait so deployments can back them with a remote
//! service; the in-memory versions serve tests and the bundled binary.

mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::EngineResult;
use crate::models::{Employee, LeaveRecord, ProgressEntry};

pub use memory::{InMemoryLeave, InMemoryProgress, InMemoryRoster, RosterFile};

/// Read access to the employee roster.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Looks up one employee.
    async fn employee(&self, employee_id: &str) -> EngineResult<Option<Employee>>;

    /// Active employees in roster order.
    async fn active_employees(&self) -> EngineResult<Vec<Employee>>;
}

/// Read access to leave records.
#[async_trait]
pub trait LeaveSource: Send + Sync {
    /// Leave records for an employee overlapping `[start, end]`, any status.
    async fn leaves_for(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<LeaveRecord>>;
}

/// Progress-tracking subsystem.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Entries for an employee and date, in submission order.
    async fn entries_for(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<ProgressEntry>>;

    /// Records a new entry.
    async fn submit(&self, entry: ProgressEntry) -> EngineResult<()>;
}
