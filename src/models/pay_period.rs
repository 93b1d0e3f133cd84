//! Pay period and public holiday models.
//!
//! This module contains the [`PayPeriod`] and [`PublicHoliday`] types that
//! define the calendar window for salary calculations.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A public holiday, excluded from the default working-day count.
///
/// # Example
///
/// ```
/// use attendance_engine::models::PublicHoliday;
/// use chrono::NaiveDate;
///
/// let holiday = PublicHoliday {
///     date: NaiveDate::from_ymd_opt(2026, 3, 26).unwrap(),
///     name: "Independence Day".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHoliday {
    /// The date of the public holiday.
    pub date: NaiveDate,
    /// The name of the public holiday.
    pub name: String,
}

/// A calendar-month pay period.
///
/// # Example
///
/// ```
/// use attendance_engine::models::PayPeriod;
/// use chrono::NaiveDate;
///
/// let period = PayPeriod::new(2, 2026).unwrap();
/// assert_eq!(period.start_date(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
/// assert_eq!(period.end_date(), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Month number, 1–12.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
}

impl PayPeriod {
    /// Creates a pay period, validating the month.
    pub fn new(month: u32, year: i32) -> EngineResult<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(EngineError::validation(
                "period",
                format!("{}-{} is not a valid month", year, month),
            ));
        }
        Ok(Self { month, year })
    }

    /// The period containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    /// First day of the period.
    ///
    /// Falls back to 1 January of the year for an out-of-range month, which
    /// only happens for values that bypassed [`PayPeriod::new`].
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .or_else(|| NaiveDate::from_ymd_opt(self.year, 1, 1))
            .unwrap_or_default()
    }

    /// Last day of the period.
    pub fn end_date(&self) -> NaiveDate {
        let start = self.start_date();
        let next = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        };
        next.and_then(|d| d.pred_opt()).unwrap_or(start)
    }

    /// Checks if a given date falls within this pay period (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// Iterates over every date in the period.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date();
        self.start_date().iter_days().take_while(move |d| *d <= end)
    }
}

impl std::fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// PP-001: contains_date within period
    #[test]
    fn test_contains_date_within_period() {
        let period = PayPeriod::new(3, 2026).unwrap();
        assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()));
    }

    /// PP-002: contains_date outside period
    #[test]
    fn test_contains_date_outside_period() {
        let period = PayPeriod::new(3, 2026).unwrap();
        assert!(!period.contains_date(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));
        assert!(!period.contains_date(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let period = PayPeriod::new(12, 2026).unwrap();
        assert_eq!(
            period.end_date(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_leap_february() {
        let period = PayPeriod::new(2, 2028).unwrap();
        assert_eq!(period.dates().count(), 29);
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(matches!(
            PayPeriod::new(13, 2026),
            Err(EngineError::Validation { .. })
        ));
        assert!(PayPeriod::new(0, 2026).is_err());
    }

    #[test]
    fn test_containing_date() {
        let period = PayPeriod::containing(NaiveDate::from_ymd_opt(2026, 7, 19).unwrap());
        assert_eq!(period, PayPeriod::new(7, 2026).unwrap());
        assert_eq!(period.to_string(), "2026-07");
    }

    #[test]
    fn test_serialize_pay_period() {
        let json = serde_json::to_string(&PayPeriod::new(3, 2026).unwrap()).unwrap();
        assert_eq!(json, r#"{"month":3,"year":2026}"#);
    }
}
