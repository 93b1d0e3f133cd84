//! Leave records supplied by the leave subsystem.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Approval state of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved; pre-empts attendance for the covered dates.
    Approved,
    /// Rejected; ignored by reconciliation.
    Rejected,
}

/// A leave request for an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRecord {
    /// The employee.
    pub employee_id: String,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Leave type as named by the leave subsystem (e.g. "annual", "sick").
    #[serde(rename = "type")]
    pub leave_type: String,
    /// Approval state.
    pub status: LeaveStatus,
}

impl LeaveRecord {
    /// Returns true if the leave is approved and covers `date`.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::models::{LeaveRecord, LeaveStatus};
    /// use chrono::NaiveDate;
    ///
    /// let leave = LeaveRecord {
    ///     employee_id: "emp_001".to_string(),
    ///     start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
    ///     end_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
    ///     leave_type: "annual".to_string(),
    ///     status: LeaveStatus::Approved,
    /// };
    /// assert!(leave.approved_on(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()));
    /// assert!(!leave.approved_on(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()));
    /// ```
    pub fn approved_on(&self, date: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved && date >= self.start_date && date <= self.end_date
    }
}
