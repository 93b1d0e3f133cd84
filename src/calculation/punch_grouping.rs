//! Biometric punch normalization.
//!
//! Groups raw punch-clock rows by `(employee, date, device)`, keeping the
//! earliest in-time and the latest out-time of each group. Rows that cannot
//! be used are returned with a reason; none are dropped silently.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::DeviceRegistry;
use crate::models::{BiometricPunch, RawPunchRow, SkipReason, SkippedRow};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// The result of grouping an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PunchGrouping {
    /// One punch per `(employee, date, device)`, sorted by that key.
    pub punches: Vec<BiometricPunch>,
    /// Rows that were not used.
    pub skipped: Vec<SkippedRow>,
}

impl PunchGrouping {
    /// Distinct `(employee, date)` keys covered by the punches.
    pub fn keys(&self) -> Vec<(String, NaiveDate)> {
        let mut keys: Vec<(String, NaiveDate)> = self
            .punches
            .iter()
            .map(|p| (p.employee_id.clone(), p.date))
            .collect();
        keys.dedup();
        keys
    }
}

/// Parses a device timestamp in any of the accepted formats.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::parse_punch_timestamp;
///
/// assert!(parse_punch_timestamp("2026-03-02 09:00").is_some());
/// assert!(parse_punch_timestamp("2026-03-02T09:00:15").is_some());
/// assert!(parse_punch_timestamp("09:00").is_none());
/// ```
pub fn parse_punch_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

type GroupKey = (String, NaiveDate, String);

struct Group {
    in_time: NaiveDateTime,
    out_time: Option<NaiveDateTime>,
}

fn parse_row(
    row: &RawPunchRow,
    devices: &DeviceRegistry,
) -> Result<(GroupKey, NaiveDateTime, Option<NaiveDateTime>), SkipReason> {
    let employee_id = devices.employee_for(&row.device_id, &row.badge_id)?;

    let in_time =
        parse_punch_timestamp(&row.in_time).ok_or_else(|| SkipReason::UnparseableTimestamp {
            value: row.in_time.clone(),
        })?;

    let out_time = match row.out_time.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_punch_timestamp(raw).ok_or_else(|| {
            SkipReason::UnparseableTimestamp {
                value: raw.to_string(),
            }
        })?),
    };

    if out_time.is_some_and(|out| out < in_time) {
        return Err(SkipReason::OutBeforeIn);
    }

    let key = (
        employee_id.to_string(),
        in_time.date(),
        row.device_id.clone(),
    );
    Ok((key, in_time, out_time))
}

/// Groups raw rows into punches.
pub fn group_punch_rows(
    rows: &[RawPunchRow],
    devices: &DeviceRegistry,
    source_file_id: &str,
) -> PunchGrouping {
    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match parse_row(row, devices) {
            Ok((key, in_time, out_time)) => {
                groups
                    .entry(key)
                    .and_modify(|group| {
                        group.in_time = group.in_time.min(in_time);
                        group.out_time = group.out_time.max(out_time);
                    })
                    .or_insert(Group { in_time, out_time });
            }
            Err(reason) => skipped.push(SkippedRow {
                row: index,
                raw: row.clone(),
                reason,
            }),
        }
    }

    let punches = groups
        .into_iter()
        .map(|((employee_id, date, device_id), group)| BiometricPunch {
            employee_id,
            date,
            device_id,
            in_time: group.in_time,
            out_time: group.out_time,
            source_file_id: source_file_id.to_string(),
        })
        .collect();

    PunchGrouping { punches, skipped }
}

/// Merges the punches of several devices for one employee and date into a
/// single earliest-in / latest-out span.
pub fn merge_device_punches(
    punches: &[BiometricPunch],
) -> Option<(NaiveDateTime, Option<NaiveDateTime>)> {
    let in_time = punches.iter().map(|p| p.in_time).min()?;
    let out_time = punches.iter().filter_map(|p| p.out_time).max();
    Some((in_time, out_time))
}
