//! Daily attendance record and discrepancy flags.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::WorkLocationTag;

/// Which evidence the daily record was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceSource {
    /// Only the employee's own start/end events.
    SelfReport,
    /// Only a biometric punch.
    Biometric,
    /// Self-report and biometric evidence were merged.
    Reconciled,
    /// Approved leave.
    Leave,
    /// Nothing was recorded for the day.
    NoEvidence,
}

/// A non-fatal annotation on a daily record, surfaced for review.
///
/// # Example
///
/// ```
/// use attendance_engine::models::DiscrepancyFlag;
/// use rust_decimal::Decimal;
///
/// let flag = DiscrepancyFlag::SelfReportBiometricMismatch {
///     self_report_hours: Decimal::new(80, 1),
///     biometric_hours: Decimal::new(65, 1),
/// };
/// assert_eq!(flag.code(), "self-report-biometric-mismatch");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum DiscrepancyFlag {
    /// Self-reported and biometric durations differ by more than the tolerance.
    SelfReportBiometricMismatch {
        /// Hours from the work session.
        self_report_hours: Decimal,
        /// Hours from the biometric punch.
        biometric_hours: Decimal,
    },
    /// A session exists but no punch was recorded.
    NoBiometricPunch,
    /// A punch exists but the employee never started the day.
    NoSelfReport,
    /// The session was force-closed by the auto-closer.
    AutoClosedNoExplicitEnd,
    /// The session was still open when the record was built.
    SessionOpen,
    /// Hours were clamped into the 0–24 range.
    HoursCapped,
}

impl DiscrepancyFlag {
    /// The stable kebab-case code for this flag.
    pub fn code(&self) -> &'static str {
        match self {
            DiscrepancyFlag::SelfReportBiometricMismatch { .. } => "self-report-biometric-mismatch",
            DiscrepancyFlag::NoBiometricPunch => "no-biometric-punch",
            DiscrepancyFlag::NoSelfReport => "no-self-report",
            DiscrepancyFlag::AutoClosedNoExplicitEnd => "auto-closed-no-explicit-end",
            DiscrepancyFlag::SessionOpen => "session-open",
            DiscrepancyFlag::HoursCapped => "hours-capped",
        }
    }

    /// Returns true for a self-report/biometric mismatch.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, DiscrepancyFlag::SelfReportBiometricMismatch { .. })
    }
}

/// The single authoritative attendance record for an employee and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAttendanceRecord {
    /// The employee.
    pub employee_id: String,
    /// The workday.
    pub date: NaiveDate,
    /// Whether the employee counts as present.
    pub is_present: bool,
    /// Payable hours, always within 0–24.
    pub hours_worked: Decimal,
    /// Which evidence produced this record.
    pub source: AttendanceSource,
    /// Annotations for review, without duplicates.
    pub discrepancy_flags: Vec<DiscrepancyFlag>,
    /// Where the employee worked, if known.
    pub work_location: Option<WorkLocationTag>,
    /// Biometric hours retained for audit when they were not used for pay.
    #[serde(default)]
    pub biometric_hours: Option<Decimal>,
}

impl DailyAttendanceRecord {
    /// Number of self-report/biometric mismatch flags on this record.
    pub fn mismatch_count(&self) -> usize {
        self.discrepancy_flags
            .iter()
            .filter(|f| f.is_mismatch())
            .count()
    }
}
