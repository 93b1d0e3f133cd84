//! Error types for the attendance engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the session lifecycle, ingestion, reconciliation and
//! payroll paths can produce.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::SessionStatus;

/// The main error type for the attendance engine.
///
/// Client-correctable variants carry messages that can be shown to the
/// employee verbatim.
///
/// # Example
///
/// ```
/// use attendance_engine::error::EngineError;
/// use chrono::NaiveDate;
///
/// let error = EngineError::ProgressRequired {
///     employee_id: "emp_001".to_string(),
///     date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Submit today's progress before ending your day (employee emp_001, 2026-03-02)"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input was malformed.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// The employee is outside every geofence and did not declare Home or Remote.
    #[error(
        "You are {distance_m:.0}m from the nearest worksite; select Home or Remote to start your day"
    )]
    LocationRequired {
        /// Distance to the nearest registered worksite in metres.
        distance_m: f64,
    },

    /// A session already exists for the employee and date.
    #[error("Your day has already been started for {date} (employee {employee_id})")]
    AlreadyStarted {
        /// The employee.
        employee_id: String,
        /// The workday.
        date: NaiveDate,
    },

    /// No session exists to end.
    #[error("Start your day before ending it (employee {employee_id}, {date})")]
    NotStarted {
        /// The employee.
        employee_id: String,
        /// The workday.
        date: NaiveDate,
    },

    /// The progress gate is unmet for the date being closed.
    #[error("Submit today's progress before ending your day (employee {employee_id}, {date})")]
    ProgressRequired {
        /// The employee.
        employee_id: String,
        /// The workday.
        date: NaiveDate,
    },

    /// The date is covered by approved leave.
    #[error("You are on approved leave on {date} (employee {employee_id})")]
    OnLeave {
        /// The employee.
        employee_id: String,
        /// The workday.
        date: NaiveDate,
    },

    /// The requested transition is not valid from the current state.
    #[error("Cannot move session for {employee_id} on {date} from {from} to {to}")]
    InvalidTransition {
        /// The employee.
        employee_id: String,
        /// The workday.
        date: NaiveDate,
        /// Current status.
        from: SessionStatus,
        /// Requested status.
        to: SessionStatus,
    },

    /// A single ingestion row could not be used.
    #[error("Row {row}: {reason}")]
    IngestionRow {
        /// Zero-based row index in the upload.
        row: usize,
        /// Why the row was skipped.
        reason: String,
    },

    /// A concurrent writer updated the daily record first.
    #[error("Reconciliation conflict for {employee_id} on {date} after {attempts} attempts")]
    ReconciliationConflict {
        /// The employee.
        employee_id: String,
        /// The workday.
        date: NaiveDate,
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// A salary calculation failed for one employee.
    #[error("Calculation error for {employee_id}: {message}")]
    Calculation {
        /// The employee.
        employee_id: String,
        /// A description of the failure.
        message: String,
    },

    /// The roster has no such employee.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The unknown employee id.
        employee_id: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },
}

impl EngineError {
    /// Returns true for errors the caller can fix by changing their request.
    pub fn is_client_correctable(&self) -> bool {
        matches!(
            self,
            EngineError::Validation { .. }
                | EngineError::LocationRequired { .. }
                | EngineError::AlreadyStarted { .. }
                | EngineError::NotStarted { .. }
                | EngineError::ProgressRequired { .. }
                | EngineError::OnLeave { .. }
                | EngineError::InvalidTransition { .. }
        )
    }

    /// Returns true for errors that may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::ReconciliationConflict { .. })
    }

    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn test_location_required_rounds_distance() {
        let error = EngineError::LocationRequired {
            distance_m: 5012.4,
        };
        assert_eq!(
            error.to_string(),
            "You are 5012m from the nearest worksite; select Home or Remote to start your day"
        );
    }

    #[test]
    fn test_already_started_displays_date() {
        let error = EngineError::AlreadyStarted {
            employee_id: "emp_001".to_string(),
            date: date(),
        };
        assert_eq!(
            error.to_string(),
            "Your day has already been started for 2026-03-02 (employee emp_001)"
        );
    }

    #[test]
    fn test_invalid_transition_displays_states() {
        let error = EngineError::InvalidTransition {
            employee_id: "emp_001".to_string(),
            date: date(),
            from: SessionStatus::Completed,
            to: SessionStatus::AutoClosed,
        };
        assert_eq!(
            error.to_string(),
            "Cannot move session for emp_001 on 2026-03-02 from completed to auto_closed"
        );
    }

    #[test]
    fn test_ingestion_row_displays_reason() {
        let error = EngineError::IngestionRow {
            row: 4,
            reason: "unmapped device 'dev-9'".to_string(),
        };
        assert_eq!(error.to_string(), "Row 4: unmapped device 'dev-9'");
    }

    #[test]
    fn test_client_correctable_classification() {
        assert!(
            EngineError::NotStarted {
                employee_id: "e".to_string(),
                date: date(),
            }
            .is_client_correctable()
        );
        assert!(
            !EngineError::Calculation {
                employee_id: "e".to_string(),
                message: "corrupt".to_string(),
            }
            .is_client_correctable()
        );
    }

    #[test]
    fn test_only_conflicts_are_transient() {
        assert!(
            EngineError::ReconciliationConflict {
                employee_id: "e".to_string(),
                date: date(),
                attempts: 3,
            }
            .is_transient()
        );
        assert!(!EngineError::validation("date", "bad").is_transient());
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_not_found() -> EngineResult<()> {
            Err(EngineError::EmployeeNotFound {
                employee_id: "ghost".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
