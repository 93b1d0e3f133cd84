//! Overtime detection.
//!
//! Splits daily hours into standard and overtime portions and sums the
//! overtime across a pay period.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AuditStep, DailyAttendanceRecord};

/// The result of detecting overtime for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyOvertimeDetection {
    /// Hours up to the threshold.
    pub ordinary_hours: Decimal,
    /// Hours exceeding the threshold.
    pub overtime_hours: Decimal,
}

/// Overtime summed across a period, with its audit step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOvertime {
    /// Total overtime hours.
    pub overtime_hours: Decimal,
    /// Number of days that contributed overtime.
    pub days_with_overtime: u32,
    /// The audit step recording this detection.
    pub audit_step: AuditStep,
}

/// Default standard working day in hours.
pub const DEFAULT_STANDARD_DAILY_HOURS: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

/// Splits worked hours at the threshold.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::{detect_daily_overtime, DEFAULT_STANDARD_DAILY_HOURS};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let result = detect_daily_overtime(Decimal::from_str("10.0").unwrap(), DEFAULT_STANDARD_DAILY_HOURS);
/// assert_eq!(result.ordinary_hours, Decimal::from_str("8.0").unwrap());
/// assert_eq!(result.overtime_hours, Decimal::from_str("2.0").unwrap());
///
/// let result = detect_daily_overtime(Decimal::from_str("6.0").unwrap(), DEFAULT_STANDARD_DAILY_HOURS);
/// assert_eq!(result.overtime_hours, Decimal::ZERO);
/// ```
pub fn detect_daily_overtime(worked_hours: Decimal, threshold: Decimal) -> DailyOvertimeDetection {
    if worked_hours > threshold {
        DailyOvertimeDetection {
            ordinary_hours: threshold,
            overtime_hours: worked_hours - threshold,
        }
    } else {
        DailyOvertimeDetection {
            ordinary_hours: worked_hours,
            overtime_hours: Decimal::ZERO,
        }
    }
}

/// Sums `max(0, hours_worked - threshold)` over the present records.
pub fn sum_period_overtime(
    records: &[DailyAttendanceRecord],
    threshold: Decimal,
    step_number: u32,
) -> PeriodOvertime {
    let mut overtime_hours = Decimal::ZERO;
    let mut days_with_overtime = 0u32;

    for record in records.iter().filter(|r| r.is_present) {
        let detection = detect_daily_overtime(record.hours_worked, threshold);
        if detection.overtime_hours > Decimal::ZERO {
            overtime_hours += detection.overtime_hours;
            days_with_overtime += 1;
        }
    }

    let reasoning = if days_with_overtime == 0 {
        format!(
            "No day exceeded the {} hour standard day",
            threshold.normalize()
        )
    } else {
        format!(
            "{} day(s) exceeded the {} hour standard day for {} overtime hours",
            days_with_overtime,
            threshold.normalize(),
            overtime_hours.normalize()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "period_overtime".to_string(),
        rule_name: "Period Overtime Detection".to_string(),
        input: serde_json::json!({
            "records": records.len(),
            "threshold": threshold.normalize().to_string()
        }),
        output: serde_json::json!({
            "overtime_hours": overtime_hours.normalize().to_string(),
            "days_with_overtime": days_with_overtime
        }),
        reasoning,
    };

    PeriodOvertime {
        overtime_hours,
        days_with_overtime,
        audit_step,
    }
}
