//! In-memory collaborator implementations.

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{LeaveSource, ProgressTracker, RosterSource};
use crate::config::load_yaml;
use crate::error::EngineResult;
use crate::models::{Employee, LeaveRecord, ProgressEntry};

/// roster.yaml file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterFile {
    /// Employees in roster order.
    #[serde(default)]
    pub employees: Vec<Employee>,
}

/// A fixed roster.
#[derive(Debug, Default)]
pub struct InMemoryRoster {
    employees: Vec<Employee>,
}

impl InMemoryRoster {
    /// Creates a roster from employees in order.
    pub fn new(employees: Vec<Employee>) -> Self {
        Self { employees }
    }

    /// Loads `roster.yaml`.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let file = load_yaml::<RosterFile>(path.as_ref())?;
        tracing::info!(
            path = %path.as_ref().display(),
            employees = file.employees.len(),
            "Loaded roster"
        );
        Ok(Self::new(file.employees))
    }
}

#[async_trait]
impl RosterSource for InMemoryRoster {
    async fn employee(&self, employee_id: &str) -> EngineResult<Option<Employee>> {
        Ok(self.employees.iter().find(|e| e.id == employee_id).cloned())
    }

    async fn active_employees(&self) -> EngineResult<Vec<Employee>> {
        Ok(self.employees.iter().filter(|e| e.active).cloned().collect())
    }
}

/// Leave records held in memory.
#[derive(Debug, Default)]
pub struct InMemoryLeave {
    records: RwLock<Vec<LeaveRecord>>,
}

impl InMemoryLeave {
    /// Creates a leave source seeded with `records`.
    pub fn new(records: Vec<LeaveRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Adds a leave record.
    pub async fn add(&self, record: LeaveRecord) {
        self.records.write().await.push(record);
    }
}

#[async_trait]
impl LeaveSource for InMemoryLeave {
    async fn leaves_for(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<LeaveRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|l| l.employee_id == employee_id && l.start_date <= end && l.end_date >= start)
            .cloned()
            .collect())
    }
}

/// Progress entries held in memory.
#[derive(Debug, Default)]
pub struct InMemoryProgress {
    entries: RwLock<Vec<ProgressEntry>>,
}

impl InMemoryProgress {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressTracker for InMemoryProgress {
    async fn entries_for(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<ProgressEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.employee_id == employee_id && e.date == date)
            .cloned()
            .collect())
    }

    async fn submit(&self, entry: ProgressEntry) -> EngineResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}
