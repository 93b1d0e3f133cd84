//! Attendance reconciliation rules.
//!
//! The evidence available for one `(employee, date)` is first classified
//! into an [`AttendanceEvidence`] variant; [`resolve_record`] then applies
//! exactly one rule per variant. Both steps are pure, so reconciling the
//! same inputs twice yields the same record.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::punch_grouping::merge_device_punches;
use crate::models::{
    AttendanceSource, BiometricPunch, DailyAttendanceRecord, DiscrepancyFlag, LeaveRecord,
    WorkLocationTag, WorkSession, hours_between,
};

/// Upper bound on payable hours for one day.
pub const MAX_DAILY_HOURS: Decimal = Decimal::from_parts(24, 0, 0, false, 0);

/// What the work session contributes to reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvidence {
    /// Session duration; `None` while the session is still open.
    pub hours: Option<Decimal>,
    /// Where the employee said they worked.
    pub work_location: WorkLocationTag,
    /// Flags raised by the session lifecycle.
    pub flags: Vec<DiscrepancyFlag>,
}

impl SessionEvidence {
    /// Extracts the evidence from a stored session.
    pub fn from_session(session: &WorkSession) -> Self {
        Self {
            hours: session.session_hours(),
            work_location: session.work_location,
            flags: session.flags.clone(),
        }
    }
}

/// What the biometric punches contribute to reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchEvidence {
    /// Earliest-in to latest-out across devices; `None` without an out punch.
    pub hours: Option<Decimal>,
}

/// The combination of evidence available for one employee and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttendanceEvidence {
    /// Approved leave covers the date; other evidence is ignored.
    Leave {
        /// The leave type, e.g. "sick".
        leave_type: String,
    },
    /// A work session and a biometric punch.
    Both {
        /// Session evidence.
        session: SessionEvidence,
        /// Punch evidence.
        punch: PunchEvidence,
    },
    /// Only a work session.
    SelfReport {
        /// Session evidence.
        session: SessionEvidence,
    },
    /// Only a biometric punch.
    Biometric {
        /// Punch evidence.
        punch: PunchEvidence,
    },
    /// Nothing recorded.
    Absent,
}

impl AttendanceEvidence {
    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AttendanceEvidence::Leave { .. } => "leave",
            AttendanceEvidence::Both { .. } => "both",
            AttendanceEvidence::SelfReport { .. } => "self_report",
            AttendanceEvidence::Biometric { .. } => "biometric",
            AttendanceEvidence::Absent => "absent",
        }
    }
}

/// Classifies the raw inputs for one key.
///
/// `punches` may hold one punch per device; they are merged into a single
/// earliest-in / latest-out span.
pub fn gather_evidence(
    date: NaiveDate,
    session: Option<&WorkSession>,
    punches: &[BiometricPunch],
    leaves: &[LeaveRecord],
) -> AttendanceEvidence {
    if let Some(leave) = leaves.iter().find(|l| l.approved_on(date)) {
        return AttendanceEvidence::Leave {
            leave_type: leave.leave_type.clone(),
        };
    }

    let punch = merge_device_punches(punches).map(|(in_time, out_time)| PunchEvidence {
        hours: out_time.map(|out| hours_between(in_time, out)),
    });
    let session = session.map(SessionEvidence::from_session);

    match (session, punch) {
        (Some(session), Some(punch)) => AttendanceEvidence::Both { session, punch },
        (Some(session), None) => AttendanceEvidence::SelfReport { session },
        (None, Some(punch)) => AttendanceEvidence::Biometric { punch },
        (None, None) => AttendanceEvidence::Absent,
    }
}

/// Applies the reconciliation rule for the evidence variant.
pub fn resolve_record(
    employee_id: &str,
    date: NaiveDate,
    evidence: &AttendanceEvidence,
    tolerance_hours: Decimal,
) -> DailyAttendanceRecord {
    let mut flags = Vec::new();

    let (is_present, hours, source, work_location, biometric_hours) = match evidence {
        AttendanceEvidence::Leave { .. } => {
            (false, Decimal::ZERO, AttendanceSource::Leave, None, None)
        }
        AttendanceEvidence::Both { session, punch } => {
            flags.extend(session.flags.iter().cloned());
            let hours = match (session.hours, punch.hours) {
                (Some(self_report), Some(biometric)) => {
                    if (self_report - biometric).abs() > tolerance_hours {
                        flags.push(DiscrepancyFlag::SelfReportBiometricMismatch {
                            self_report_hours: self_report,
                            biometric_hours: biometric,
                        });
                    }
                    self_report
                }
                (Some(self_report), None) => self_report,
                (None, biometric) => {
                    flags.push(DiscrepancyFlag::SessionOpen);
                    biometric.unwrap_or(Decimal::ZERO)
                }
            };
            (
                true,
                hours,
                AttendanceSource::Reconciled,
                Some(session.work_location),
                punch.hours,
            )
        }
        AttendanceEvidence::SelfReport { session } => {
            flags.extend(session.flags.iter().cloned());
            let hours = session.hours.unwrap_or_else(|| {
                flags.push(DiscrepancyFlag::SessionOpen);
                Decimal::ZERO
            });
            flags.push(DiscrepancyFlag::NoBiometricPunch);
            (
                true,
                hours,
                AttendanceSource::SelfReport,
                Some(session.work_location),
                None,
            )
        }
        AttendanceEvidence::Biometric { punch } => {
            flags.push(DiscrepancyFlag::NoSelfReport);
            (
                true,
                punch.hours.unwrap_or(Decimal::ZERO),
                AttendanceSource::Biometric,
                Some(WorkLocationTag::Office),
                punch.hours,
            )
        }
        AttendanceEvidence::Absent => {
            (false, Decimal::ZERO, AttendanceSource::NoEvidence, None, None)
        }
    };

    let hours_worked = if hours > MAX_DAILY_HOURS {
        flags.push(DiscrepancyFlag::HoursCapped);
        MAX_DAILY_HOURS
    } else if hours < Decimal::ZERO {
        flags.push(DiscrepancyFlag::HoursCapped);
        Decimal::ZERO
    } else {
        hours
    };

    DailyAttendanceRecord {
        employee_id: employee_id.to_string(),
        date,
        is_present,
        hours_worked,
        source,
        discrepancy_flags: dedup_flags(flags),
        work_location,
        biometric_hours,
    }
}

fn dedup_flags(flags: Vec<DiscrepancyFlag>) -> Vec<DiscrepancyFlag> {
    let mut unique: Vec<DiscrepancyFlag> = Vec::with_capacity(flags.len());
    for flag in flags {
        if !unique.contains(&flag) {
            unique.push(flag);
        }
    }
    unique
}
