//! Calculation logic for the attendance engine.
//!
//! Pure functions with no I/O: geofence checks, biometric punch grouping,
//! the reconciliation rules, working-day and overtime detection, and salary
//! computation. The services in [`crate::engine`] gather inputs from the
//! store and collaborators and call into this module.

mod geofence;
mod overtime;
mod punch_grouping;
mod reconciliation;
mod salary;
mod working_days;

pub use geofence::{EARTH_RADIUS_M, check_geofence, classify_work_location, haversine_distance_m};
pub use overtime::{
    DEFAULT_STANDARD_DAILY_HOURS, DailyOvertimeDetection, PeriodOvertime, detect_daily_overtime,
    sum_period_overtime,
};
pub use punch_grouping::{
    PunchGrouping, group_punch_rows, merge_device_punches, parse_punch_timestamp,
};
pub use reconciliation::{
    AttendanceEvidence, MAX_DAILY_HOURS, PunchEvidence, SessionEvidence, gather_evidence,
    resolve_record,
};
pub use salary::{
    SalaryInputs, attendance_rate, build_recommendations, compute_salary, net_pay,
};
pub use working_days::{DayType, get_day_type, working_days_in_period};
