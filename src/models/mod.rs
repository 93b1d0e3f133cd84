//! Core data models for the attendance engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod employee;
mod event;
mod leave;
mod location;
mod pay_period;
mod progress;
mod punch;
mod salary;
mod session;

pub use attendance::{AttendanceSource, DailyAttendanceRecord, DiscrepancyFlag};
pub use employee::Employee;
pub use event::{EventType, StateChangeEvent};
pub use leave::{LeaveRecord, LeaveStatus};
pub use location::{CheckedLocation, Coordinate, GeofenceCheck, LocationConfidence, WorkLocationTag};
pub use pay_period::{PayPeriod, PublicHoliday};
pub use progress::ProgressEntry;
pub use punch::{BiometricPunch, RawPunchRow, SkipReason, SkippedRow};
pub use salary::{
    AuditStep, AuditTrace, BulkSalaryOutcome, ComponentAmount, PayComponent, PayComponentRule,
    Recommendation, SalaryCalculation, SalaryFailure, Severity,
};
pub use session::{ClosedBy, SessionStatus, WorkSession, hours_between};
