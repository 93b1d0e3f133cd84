//! Salary calculation result models.
//!
//! This module contains the [`SalaryCalculation`] type and its associated
//! structures: pay components, review recommendations, the audit trace of
//! calculation steps and the batch outcome of a bulk run.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PayPeriod;

/// How a pay component's amount is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentAmount {
    /// A flat amount per period.
    Fixed(Decimal),
    /// A percentage of the monthly base salary.
    PercentOfBase(Decimal),
}

/// A configured allowance or deduction.
///
/// # Example
///
/// ```
/// use attendance_engine::models::{ComponentAmount, PayComponentRule};
/// use rust_decimal::Decimal;
///
/// let rule: PayComponentRule =
///     serde_json::from_str(r#"{"name": "tax", "percent_of_base": "5"}"#).unwrap();
/// assert_eq!(rule.resolve(Decimal::new(40000, 0)).amount, Decimal::new(2000, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayComponentRule {
    /// Component name (e.g., "transport", "tax").
    pub name: String,
    /// How the amount is derived.
    #[serde(flatten)]
    pub amount: ComponentAmount,
}

impl PayComponentRule {
    /// Resolves the rule against a base salary, rounding to cents.
    pub fn resolve(&self, base_salary: Decimal) -> PayComponent {
        let amount = match self.amount {
            ComponentAmount::Fixed(amount) => amount,
            ComponentAmount::PercentOfBase(percent) => base_salary * percent / Decimal::ONE_HUNDRED,
        };
        PayComponent {
            name: self.name.clone(),
            amount: amount.round_dp(2),
        }
    }
}

/// A resolved allowance or deduction line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayComponent {
    /// Component name.
    pub name: String,
    /// Resolved amount for the period.
    pub amount: Decimal,
}

/// How urgently a salary result needs human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Nothing unusual.
    Low,
    /// Isolated evidence conflicts.
    Medium,
    /// Low attendance or repeated conflicts.
    High,
}

/// A review recommendation attached to a salary result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// How urgent the recommendation is.
    pub severity: Severity,
    /// What the reviewer should look at.
    pub message: String,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The complete audit trace for a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

/// Payable salary for one employee and period.
///
/// Recalculating for the same `(employee_id, period)` supersedes the stored
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryCalculation {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub calculated_at: NaiveDateTime,
    /// The employee.
    pub employee_id: String,
    /// The pay period.
    pub period: PayPeriod,
    /// Monthly base salary from the roster.
    pub base_salary: Decimal,
    /// Working days used as the denominator.
    pub working_days: u32,
    /// Days with a present attendance record.
    pub present_days: u32,
    /// Present days as a percentage of working days, capped at 100.
    pub attendance_rate: Decimal,
    /// Hours beyond the standard day, summed across the period.
    pub overtime_hours: Decimal,
    /// Pay for the overtime hours.
    pub overtime_pay: Decimal,
    /// Pro-rata base plus overtime plus allowances.
    pub gross_salary: Decimal,
    /// Resolved allowances.
    pub allowances: Vec<PayComponent>,
    /// Resolved deductions.
    pub deductions: Vec<PayComponent>,
    /// `max(0, gross_salary - deductions)`.
    pub net_pay: Decimal,
    /// Self-report/biometric mismatches seen in the period.
    pub mismatch_count: u32,
    /// Review recommendations, highest severity first.
    pub recommendations: Vec<Recommendation>,
    /// Record of each calculation step.
    pub audit_trace: AuditTrace,
}

impl SalaryCalculation {
    /// The most severe recommendation, if any.
    pub fn highest_severity(&self) -> Option<Severity> {
        self.recommendations.iter().map(|r| r.severity).max()
    }
}

/// One employee's failure within a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryFailure {
    /// The employee that failed.
    pub employee_id: String,
    /// The error, rendered for the report.
    pub error: String,
}

/// The outcome of a bulk salary run.
///
/// Successes and failures are always separated so that only the failed
/// (and not-started) employees need re-running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSalaryOutcome {
    /// The period that was calculated.
    pub period: PayPeriod,
    /// Completed calculations, in roster order.
    pub successes: Vec<SalaryCalculation>,
    /// Per-employee failures, in roster order.
    pub failures: Vec<SalaryFailure>,
    /// Employees never started because the run was cancelled.
    pub not_started: Vec<String>,
    /// Whether cancellation was requested during the run.
    pub cancelled: bool,
}

impl BulkSalaryOutcome {
    /// Employee ids that should be submitted again.
    pub fn rerun_ids(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| f.employee_id.clone())
            .chain(self.not_started.iter().cloned())
            .collect()
    }
}
