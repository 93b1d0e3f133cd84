//! Employee model as supplied by the roster service.
//!
//! The engine only reads these fields; the roster owns the data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PayComponentRule;

fn default_active() -> bool {
    true
}

/// Represents an employee on the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Job role (e.g., "engineer").
    #[serde(default)]
    pub role: String,
    /// Department name, used for live-attendance filters.
    #[serde(default)]
    pub department: String,
    /// Monthly base salary.
    pub base_salary: Decimal,
    /// Inactive employees are skipped by bulk payroll.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Employee-specific allowances on top of the policy allowances.
    #[serde(default)]
    pub allowances: Vec<PayComponentRule>,
    /// Employee-specific deductions on top of the policy deductions.
    #[serde(default)]
    pub deductions: Vec<PayComponentRule>,
}
