//! Progress entries supplied by the progress-tracking subsystem.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An employee's daily progress report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// The employee.
    pub employee_id: String,
    /// The day reported on.
    pub date: NaiveDate,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// What was achieved.
    #[serde(default)]
    pub achievements: String,
    /// What is blocking progress.
    #[serde(default)]
    pub blockers: String,
}

impl ProgressEntry {
    /// Returns true if any text field has non-whitespace content.
    pub fn has_content(&self) -> bool {
        [&self.notes, &self.achievements, &self.blockers]
            .iter()
            .any(|text| !text.trim().is_empty())
    }
}
