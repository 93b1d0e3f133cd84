//! Salary computation.
//!
//! [`compute_salary`] turns one employee's reconciled daily records for a
//! pay period into a [`SalaryCalculation`], recording every step in an
//! audit trace.
//!
//! # Formulae
//!
//! ```text
//! attendance_rate = min(100, present_days / working_days × 100)
//! daily_rate      = base_salary / working_days
//! overtime_pay    = overtime_hours × daily_rate / standard_daily_hours × multiplier
//! gross_salary    = daily_rate × present_days + overtime_pay + Σ allowances
//! net_pay         = max(0, gross_salary − Σ deductions)
//! ```

use std::time::Instant;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::overtime::sum_period_overtime;
use super::reconciliation::MAX_DAILY_HOURS;
use crate::config::PayrollPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, DailyAttendanceRecord, Employee, PayComponent, PayPeriod,
    Recommendation, SalaryCalculation, Severity,
};

/// Present days as a percentage of working days, capped at 100.
///
/// Returns zero when `working_days` is zero.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::attendance_rate;
/// use rust_decimal::Decimal;
///
/// assert_eq!(attendance_rate(11, 22), Decimal::new(50, 0));
/// assert_eq!(attendance_rate(25, 22), Decimal::ONE_HUNDRED);
/// ```
pub fn attendance_rate(present_days: u32, working_days: u32) -> Decimal {
    if working_days == 0 {
        return Decimal::ZERO;
    }
    let rate = Decimal::from(present_days) / Decimal::from(working_days) * Decimal::ONE_HUNDRED;
    rate.min(Decimal::ONE_HUNDRED)
}

/// `max(0, gross - deductions)`.
pub fn net_pay(gross_salary: Decimal, total_deductions: Decimal) -> Decimal {
    (gross_salary - total_deductions).max(Decimal::ZERO)
}

/// Builds review recommendations, highest severity first.
///
/// Low attendance and repeated mismatches are High; isolated mismatches
/// are Medium; a clean period gets a single Low recommendation.
pub fn build_recommendations(
    attendance_rate: Decimal,
    mismatch_count: u32,
    policy: &PayrollPolicy,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if attendance_rate < policy.low_attendance_threshold {
        recommendations.push(Recommendation {
            severity: Severity::High,
            message: format!(
                "Attendance rate {}% is below the {}% threshold",
                attendance_rate.round_dp(2).normalize(),
                policy.low_attendance_threshold.normalize()
            ),
        });
    }

    if mismatch_count > policy.mismatch_threshold {
        recommendations.push(Recommendation {
            severity: Severity::High,
            message: format!(
                "{} self-report/biometric mismatches exceed the threshold of {}; audit the period",
                mismatch_count, policy.mismatch_threshold
            ),
        });
    } else if mismatch_count > 0 {
        recommendations.push(Recommendation {
            severity: Severity::Medium,
            message: format!(
                "{} self-report/biometric mismatch(es) to review",
                mismatch_count
            ),
        });
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation {
            severity: Severity::Low,
            message: "No attendance anomalies in the period".to_string(),
        });
    }

    recommendations.sort_by(|a, b| b.severity.cmp(&a.severity));
    recommendations
}

/// Everything a single salary computation reads.
#[derive(Debug, Clone, Copy)]
pub struct SalaryInputs<'a> {
    /// The employee from the roster.
    pub employee: &'a Employee,
    /// The pay period.
    pub period: PayPeriod,
    /// Working days in the period; must be positive.
    pub working_days: u32,
    /// Reconciled records; records outside the period are ignored.
    pub records: &'a [DailyAttendanceRecord],
    /// Payroll policy.
    pub policy: &'a PayrollPolicy,
}

fn sum_components(components: &[PayComponent]) -> Decimal {
    components.iter().map(|c| c.amount).sum()
}

fn step(
    step_number: u32,
    rule_id: &str,
    rule_name: &str,
    input: serde_json::Value,
    output: serde_json::Value,
    reasoning: String,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        input,
        output,
        reasoning,
    }
}

/// Computes the salary for one employee and period.
///
/// # Errors
///
/// - [`EngineError::Validation`] if `working_days` or the policy's standard
///   day is zero.
/// - [`EngineError::Calculation`] if the base salary is negative or a
///   record in the period has hours outside 0–24.
pub fn compute_salary(
    inputs: SalaryInputs<'_>,
    calculated_at: NaiveDateTime,
) -> EngineResult<SalaryCalculation> {
    let started = Instant::now();
    let SalaryInputs {
        employee,
        period,
        working_days,
        records,
        policy,
    } = inputs;

    if working_days == 0 {
        return Err(EngineError::validation(
            "working_days",
            "must be greater than zero",
        ));
    }
    if policy.standard_daily_hours <= Decimal::ZERO {
        return Err(EngineError::validation(
            "standard_daily_hours",
            "must be greater than zero",
        ));
    }

    if employee.base_salary < Decimal::ZERO {
        return Err(EngineError::Calculation {
            employee_id: employee.id.clone(),
            message: format!("base salary {} is negative", employee.base_salary),
        });
    }

    let in_period: Vec<DailyAttendanceRecord> = records
        .iter()
        .filter(|r| r.employee_id == employee.id && period.contains_date(r.date))
        .cloned()
        .collect();

    if let Some(corrupt) = in_period
        .iter()
        .find(|r| r.hours_worked < Decimal::ZERO || r.hours_worked > MAX_DAILY_HOURS)
    {
        return Err(EngineError::Calculation {
            employee_id: employee.id.clone(),
            message: format!(
                "record for {} has {} hours worked",
                corrupt.date, corrupt.hours_worked
            ),
        });
    }

    let mut steps = Vec::new();

    // Step 1: attendance
    let present_days = u32::try_from(in_period.iter().filter(|r| r.is_present).count())
        .unwrap_or(u32::MAX);
    let rate = attendance_rate(present_days, working_days);
    steps.push(step(
        1,
        "attendance_rate",
        "Attendance Rate",
        serde_json::json!({
            "records": in_period.len(),
            "working_days": working_days
        }),
        serde_json::json!({
            "present_days": present_days,
            "attendance_rate": rate.round_dp(2).normalize().to_string()
        }),
        format!(
            "{} present day(s) out of {} working day(s)",
            present_days, working_days
        ),
    ));

    // Step 2: pro-rata base
    let daily_rate = employee.base_salary / Decimal::from(working_days);
    let prorated_base = (daily_rate * Decimal::from(present_days)).round_dp(2);
    steps.push(step(
        2,
        "prorated_base",
        "Pro-rata Base Salary",
        serde_json::json!({
            "base_salary": employee.base_salary.normalize().to_string(),
            "working_days": working_days,
            "present_days": present_days
        }),
        serde_json::json!({
            "daily_rate": daily_rate.round_dp(2).normalize().to_string(),
            "prorated_base": prorated_base.normalize().to_string()
        }),
        format!(
            "{} / {} × {} = {}",
            employee.base_salary.normalize(),
            working_days,
            present_days,
            prorated_base.normalize()
        ),
    ));

    // Step 3: overtime
    let overtime = sum_period_overtime(&in_period, policy.standard_daily_hours, 3);
    let overtime_hours = overtime.overtime_hours;
    steps.push(overtime.audit_step);

    let hourly_rate = daily_rate / policy.standard_daily_hours;
    let overtime_pay = (overtime_hours * hourly_rate * policy.overtime_multiplier).round_dp(2);
    steps.push(step(
        4,
        "overtime_pay",
        "Overtime Pay",
        serde_json::json!({
            "overtime_hours": overtime_hours.normalize().to_string(),
            "hourly_rate": hourly_rate.round_dp(2).normalize().to_string(),
            "multiplier": policy.overtime_multiplier.normalize().to_string()
        }),
        serde_json::json!({
            "overtime_pay": overtime_pay.normalize().to_string()
        }),
        format!(
            "{} overtime hours at {}× the hourly rate",
            overtime_hours.normalize(),
            policy.overtime_multiplier.normalize()
        ),
    ));

    // Step 5: allowances and deductions
    let allowances: Vec<PayComponent> = policy
        .allowances
        .iter()
        .chain(employee.allowances.iter())
        .map(|rule| rule.resolve(employee.base_salary))
        .collect();
    let deductions: Vec<PayComponent> = policy
        .deductions
        .iter()
        .chain(employee.deductions.iter())
        .map(|rule| rule.resolve(employee.base_salary))
        .collect();
    let total_allowances = sum_components(&allowances);
    let total_deductions = sum_components(&deductions);
    steps.push(step(
        5,
        "pay_components",
        "Allowances and Deductions",
        serde_json::json!({
            "allowances": allowances.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "deductions": deductions.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        }),
        serde_json::json!({
            "total_allowances": total_allowances.normalize().to_string(),
            "total_deductions": total_deductions.normalize().to_string()
        }),
        format!(
            "{} allowance(s) and {} deduction(s) applied",
            allowances.len(),
            deductions.len()
        ),
    ));

    // Step 6: gross and net
    let gross_salary = (prorated_base + overtime_pay + total_allowances).round_dp(2);
    let net = net_pay(gross_salary, total_deductions).round_dp(2);
    steps.push(step(
        6,
        "net_pay",
        "Net Pay",
        serde_json::json!({
            "gross_salary": gross_salary.normalize().to_string(),
            "total_deductions": total_deductions.normalize().to_string()
        }),
        serde_json::json!({
            "net_pay": net.normalize().to_string()
        }),
        if gross_salary < total_deductions {
            "Deductions exceed gross salary; net pay floored at zero".to_string()
        } else {
            format!(
                "{} - {} = {}",
                gross_salary.normalize(),
                total_deductions.normalize(),
                net.normalize()
            )
        },
    ));

    // Step 7: review recommendations
    let mismatch_count =
        u32::try_from(in_period.iter().map(|r| r.mismatch_count()).sum::<usize>())
            .unwrap_or(u32::MAX);
    let recommendations = build_recommendations(rate, mismatch_count, policy);
    steps.push(step(
        7,
        "recommendations",
        "Review Recommendations",
        serde_json::json!({
            "attendance_rate": rate.round_dp(2).normalize().to_string(),
            "mismatch_count": mismatch_count
        }),
        serde_json::json!({
            "recommendations": recommendations.len()
        }),
        format!(
            "Highest severity {:?}",
            recommendations
                .first()
                .map(|r| r.severity)
                .unwrap_or(Severity::Low)
        ),
    ));

    let duration_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    Ok(SalaryCalculation {
        calculation_id: Uuid::new_v4(),
        calculated_at,
        employee_id: employee.id.clone(),
        period,
        base_salary: employee.base_salary,
        working_days,
        present_days,
        attendance_rate: rate,
        overtime_hours,
        overtime_pay,
        gross_salary,
        allowances,
        deductions,
        net_pay: net,
        mismatch_count,
        recommendations,
        audit_trace: AuditTrace { steps, duration_us },
    })
}
