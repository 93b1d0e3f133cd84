//! Work session model and lifecycle states.
//!
//! A [`WorkSession`] is the durable record of one employee's workday, keyed
//! by `(employee_id, date)`. It is only ever changed by the transitions in
//! [`crate::engine::SessionStateMachine`].

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CheckedLocation, DiscrepancyFlag, WorkLocationTag};

/// Lifecycle state of a workday.
///
/// `NotStarted` and `OnLeave` are derived states: no session row exists for
/// them. `Completed` and `AutoClosed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No start-day event has been recorded.
    NotStarted,
    /// The day has been started and not yet ended.
    InProgress,
    /// The employee ended the day.
    Completed,
    /// The day was force-closed by the auto-closer.
    AutoClosed,
    /// Approved leave covers the date.
    OnLeave,
}

impl SessionStatus {
    /// Returns true for states no transition can leave.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::AutoClosed | SessionStatus::OnLeave
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::NotStarted => write!(f, "not_started"),
            SessionStatus::InProgress => write!(f, "in_progress"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::AutoClosed => write!(f, "auto_closed"),
            SessionStatus::OnLeave => write!(f, "on_leave"),
        }
    }
}

/// Who closed a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedBy {
    /// The employee ended the day.
    User,
    /// The scheduled sweep closed it.
    AutoCloser,
}

/// One employee's self-reported workday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSession {
    /// The employee.
    pub employee_id: String,
    /// The workday this session belongs to.
    pub date: NaiveDate,
    /// When the day was started.
    pub start_time: Option<NaiveDateTime>,
    /// When the day was ended (or force-closed).
    pub end_time: Option<NaiveDateTime>,
    /// Location reported at start, with its geofence outcome.
    pub start_location: CheckedLocation,
    /// Location reported at end, if any.
    #[serde(default)]
    pub end_location: Option<CheckedLocation>,
    /// Where the employee worked.
    pub work_location: WorkLocationTag,
    /// Who closed the session, once closed.
    #[serde(default)]
    pub closed_by: Option<ClosedBy>,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Anomalies raised by the lifecycle itself.
    #[serde(default)]
    pub flags: Vec<DiscrepancyFlag>,
}

impl WorkSession {
    /// Hours between start and end, floored at zero.
    ///
    /// Returns `None` while the session is still open.
    pub fn session_hours(&self) -> Option<Decimal> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(hours_between(start, end)),
            _ => None,
        }
    }
}

/// Hours between two instants, rounded to two places and floored at zero.
///
/// # Example
///
/// ```
/// use attendance_engine::models::hours_between;
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let start = NaiveDateTime::parse_from_str("2026-03-02 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let end = NaiveDateTime::parse_from_str("2026-03-02 17:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// assert_eq!(hours_between(start, end), Decimal::new(85, 1));
/// ```
pub fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> Decimal {
    let minutes = (end - start).num_minutes().max(0);
    (Decimal::new(minutes, 0) / Decimal::new(60, 0)).round_dp(2)
}
