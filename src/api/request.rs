//! Request types for the attendance API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::LiveAttendanceFilter;
use crate::error::EngineResult;
use crate::models::{
    Coordinate, PayPeriod, ProgressEntry, RawPunchRow, SessionStatus, WorkLocationTag,
};

/// A GPS fix as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationRequest {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Reported accuracy in metres.
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl From<LocationRequest> for Coordinate {
    fn from(req: LocationRequest) -> Self {
        Coordinate {
            latitude: req.latitude,
            longitude: req.longitude,
            accuracy_m: req.accuracy_m,
        }
    }
}

/// Request body for `POST /attendance/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartDayRequest {
    /// The employee starting their day.
    pub employee_id: String,
    /// The workday; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Where the employee is.
    pub location: LocationRequest,
    /// Declared work location, required outside every geofence.
    #[serde(default)]
    pub work_location: Option<WorkLocationTag>,
}

/// Request body for `POST /attendance/end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndDayRequest {
    /// The employee ending their day.
    pub employee_id: String,
    /// The workday; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Where the employee is, if the client sent a fix.
    #[serde(default)]
    pub location: Option<LocationRequest>,
}

/// Query string for `GET /attendance/live`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveAttendanceQuery {
    /// The date to show; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Department filter.
    #[serde(default)]
    pub department: Option<String>,
    /// Status filter.
    #[serde(default)]
    pub status: Option<SessionStatus>,
    /// Work location filter.
    #[serde(default)]
    pub work_location: Option<WorkLocationTag>,
}

impl LiveAttendanceQuery {
    /// Splits the query into its date and filter parts.
    pub fn into_parts(self) -> (Option<NaiveDate>, LiveAttendanceFilter) {
        (
            self.date,
            LiveAttendanceFilter {
                department: self.department,
                status: self.status,
                work_location: self.work_location,
            },
        )
    }
}

/// Request body for `POST /biometric/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiometricUploadRequest {
    /// Identifier of the uploaded file; generated when absent.
    #[serde(default)]
    pub source_file_id: Option<String>,
    /// Already-parsed rows from the device export.
    pub rows: Vec<RawPunchRow>,
}

/// Request body for `POST /salary/calculate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryRequest {
    /// The employee.
    pub employee_id: String,
    /// Month, 1-12.
    pub month: u32,
    /// Year.
    pub year: i32,
    /// Overrides the calendar-derived working days.
    #[serde(default)]
    pub working_days: Option<u32>,
}

impl SalaryRequest {
    /// The requested pay period.
    pub fn period(&self) -> EngineResult<PayPeriod> {
        PayPeriod::new(self.month, self.year)
    }
}

/// Request body for `POST /salary/bulk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSalaryRequest {
    /// Month, 1-12.
    pub month: u32,
    /// Year.
    pub year: i32,
    /// Overrides the calendar-derived working days.
    #[serde(default)]
    pub working_days: Option<u32>,
}

impl BulkSalaryRequest {
    /// The requested pay period.
    pub fn period(&self) -> EngineResult<PayPeriod> {
        PayPeriod::new(self.month, self.year)
    }
}

/// Request body for `POST /progress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRequest {
    /// The employee.
    pub employee_id: String,
    /// The day reported on; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
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

impl ProgressRequest {
    /// Converts into a progress entry for `date`.
    pub fn into_entry(self, date: NaiveDate) -> ProgressEntry {
        ProgressEntry {
            employee_id: self.employee_id,
            date: self.date.unwrap_or(date),
            notes: self.notes,
            achievements: self.achievements,
            blockers: self.blockers,
        }
    }
}
