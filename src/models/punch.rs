//! Biometric punch models.
//!
//! Raw rows arrive already parsed from the file-intake collaborator as
//! strings; [`crate::calculation::group_punch_rows`] turns them into
//! [`BiometricPunch`] values keyed by `(employee_id, date, device_id)`.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::hours_between;

/// A single row from a punch-clock export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPunchRow {
    /// The device that recorded the punch.
    pub device_id: String,
    /// The enrollment id of the person on that device.
    pub badge_id: String,
    /// In-time as exported by the device.
    pub in_time: String,
    /// Out-time as exported by the device, if the row has one.
    #[serde(default)]
    pub out_time: Option<String>,
}

/// A normalized in/out pair for one employee, date and device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricPunch {
    /// The employee the badge is enrolled to.
    pub employee_id: String,
    /// The workday, taken from the earliest in-time.
    pub date: NaiveDate,
    /// The recording device.
    pub device_id: String,
    /// Earliest in-time in the group.
    pub in_time: NaiveDateTime,
    /// Latest out-time in the group, if any row had one.
    pub out_time: Option<NaiveDateTime>,
    /// The upload this punch came from.
    pub source_file_id: String,
}

impl BiometricPunch {
    /// Hours between in and out, or `None` without an out punch.
    pub fn duration_hours(&self) -> Option<Decimal> {
        self.out_time.map(|out| hours_between(self.in_time, out))
    }
}

/// Why an ingestion row was not used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The device is not in the registry.
    UnmappedDevice {
        /// The unknown device.
        device_id: String,
    },
    /// The device is known but the badge is not enrolled.
    UnmappedBadge {
        /// The device.
        device_id: String,
        /// The unknown badge.
        badge_id: String,
    },
    /// A timestamp could not be parsed.
    UnparseableTimestamp {
        /// The raw value.
        value: String,
    },
    /// The out-time precedes the in-time.
    OutBeforeIn,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnmappedDevice { device_id } => write!(f, "unmapped device '{}'", device_id),
            SkipReason::UnmappedBadge {
                device_id,
                badge_id,
            } => write!(f, "badge '{}' is not enrolled on device '{}'", badge_id, device_id),
            SkipReason::UnparseableTimestamp { value } => {
                write!(f, "unparseable timestamp '{}'", value)
            }
            SkipReason::OutBeforeIn => write!(f, "out-time is earlier than in-time"),
        }
    }
}

/// A row that was collected rather than ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// Zero-based index of the row in the upload.
    pub row: usize,
    /// The row as received.
    pub raw: RawPunchRow,
    /// Why it was skipped.
    pub reason: SkipReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_duration_requires_out_time() {
        let mut punch = BiometricPunch {
            employee_id: "emp_001".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            device_id: "gate-1".to_string(),
            in_time: make_datetime("2026-03-02 09:00:00"),
            out_time: None,
            source_file_id: "upload-1".to_string(),
        };
        assert_eq!(punch.duration_hours(), None);

        punch.out_time = Some(make_datetime("2026-03-02 15:30:00"));
        assert_eq!(punch.duration_hours(), Some(Decimal::new(65, 1)));
    }

    #[test]
    fn test_skip_reason_messages() {
        let reason = SkipReason::UnmappedBadge {
            device_id: "gate-1".to_string(),
            badge_id: "77".to_string(),
        };
        assert_eq!(
            reason.to_string(),
            "badge '77' is not enrolled on device 'gate-1'"
        );
        assert_eq!(
            SkipReason::OutBeforeIn.to_string(),
            "out-time is earlier than in-time"
        );
    }

    #[test]
    fn test_skip_reason_serializes_with_kind_tag() {
        let json = serde_json::to_string(&SkipReason::UnparseableTimestamp {
            value: "yesterday".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"kind":"unparseable_timestamp","value":"yesterday"}"#
        );
    }
}
