//! State-change events emitted after every transition.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::SessionStatus;

/// What kind of transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A workday was started.
    DayStarted,
    /// A workday was ended by the employee.
    DayEnded,
    /// A workday was force-closed.
    DayAutoClosed,
    /// The daily record was rebuilt.
    AttendanceReconciled,
}

/// A transition notification for external real-time delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangeEvent {
    /// What happened.
    pub event_type: EventType,
    /// The employee.
    pub employee_id: String,
    /// The workday.
    pub date: NaiveDate,
    /// The employee's workday status after the transition.
    pub new_status: SessionStatus,
    /// When the transition was applied.
    pub occurred_at: NaiveDateTime,
}
