//! Working-day detection.
//!
//! Classifies calendar dates and counts the working days of a pay period:
//! Monday through Friday, minus configured public holidays.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{PayPeriod, PublicHoliday};

/// The type of a calendar day for payroll purposes.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::DayType;
///
/// assert_eq!(DayType::PublicHoliday.to_string(), "Public holiday");
/// assert!(DayType::Workday.is_working_day());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    /// Monday through Friday, not a holiday.
    Workday,
    /// Saturday or Sunday.
    Weekend,
    /// A configured public holiday falling on a weekday.
    PublicHoliday,
}

impl DayType {
    /// Returns true if the day counts towards working days.
    pub fn is_working_day(&self) -> bool {
        matches!(self, DayType::Workday)
    }
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayType::Workday => write!(f, "Workday"),
            DayType::Weekend => write!(f, "Weekend"),
            DayType::PublicHoliday => write!(f, "Public holiday"),
        }
    }
}

/// Determines the day type of a date.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{get_day_type, DayType};
/// use chrono::NaiveDate;
///
/// // 2026-03-07 is a Saturday
/// let saturday = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
/// assert_eq!(get_day_type(saturday, &[]), DayType::Weekend);
///
/// // 2026-03-02 is a Monday
/// let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// assert_eq!(get_day_type(monday, &[]), DayType::Workday);
/// ```
pub fn get_day_type(date: NaiveDate, holidays: &[PublicHoliday]) -> DayType {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => DayType::Weekend,
        _ if holidays.iter().any(|h| h.date == date) => DayType::PublicHoliday,
        _ => DayType::Workday,
    }
}

/// Counts the working days in a pay period.
pub fn working_days_in_period(period: &PayPeriod, holidays: &[PublicHoliday]) -> u32 {
    let holiday_dates: HashSet<NaiveDate> = holidays.iter().map(|h| h.date).collect();
    let count = period
        .dates()
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .filter(|date| !holiday_dates.contains(date))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holiday(y: i32, m: u32, d: u32) -> PublicHoliday {
        PublicHoliday {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            name: "Holiday".to_string(),
        }
    }

    // ==========================================================================
    // WD-001: March 2026 has 22 weekdays
    // ==========================================================================
    #[test]
    fn test_wd_001_weekdays_in_march_2026() {
        let period = PayPeriod::new(3, 2026).unwrap();
        assert_eq!(working_days_in_period(&period, &[]), 22);
    }

    // ==========================================================================
    // WD-002: a weekday holiday is excluded, a weekend holiday is not double counted
    // ==========================================================================
    #[test]
    fn test_wd_002_holidays_excluded() {
        let period = PayPeriod::new(3, 2026).unwrap();
        // 2026-03-26 is a Thursday, 2026-03-28 a Saturday
        let holidays = vec![holiday(2026, 3, 26), holiday(2026, 3, 28)];
        assert_eq!(working_days_in_period(&period, &holidays), 21);
    }

    #[test]
    fn test_holiday_outside_period_ignored() {
        let period = PayPeriod::new(3, 2026).unwrap();
        assert_eq!(working_days_in_period(&period, &[holiday(2026, 4, 1)]), 22);
    }

    #[test]
    fn test_february_2026() {
        let period = PayPeriod::new(2, 2026).unwrap();
        assert_eq!(working_days_in_period(&period, &[]), 20);
    }

    #[test]
    fn test_day_type_for_holiday() {
        let holidays = vec![holiday(2026, 3, 26)];
        assert_eq!(
            get_day_type(NaiveDate::from_ymd_opt(2026, 3, 26).unwrap(), &holidays),
            DayType::PublicHoliday
        );
        assert_eq!(
            get_day_type(NaiveDate::from_ymd_opt(2026, 3, 28).unwrap(), &holidays),
            DayType::Weekend
        );
        assert!(!DayType::PublicHoliday.is_working_day());
    }
}
