//! Configuration types for the attendance engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Every policy section has
//! defaults, so a partial `engine.yaml` is accepted.

use std::collections::HashMap;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{PayComponentRule, PublicHoliday, SkipReason};

/// A registered worksite with a circular geofence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Worksite {
    /// Stable identifier (e.g., "dhaka-hq").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Latitude of the geofence centre.
    pub latitude: f64,
    /// Longitude of the geofence centre.
    pub longitude: f64,
    /// Site-specific radius; falls back to the geofence default.
    #[serde(default)]
    pub radius_m: Option<f64>,
}

/// worksites.yaml file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorksitesConfig {
    /// Registered worksites.
    #[serde(default)]
    pub worksites: Vec<Worksite>,
}

/// A biometric punch device and its enrollments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Device {
    /// Device identifier as it appears in exports.
    pub id: String,
    /// The worksite the device is installed at.
    #[serde(default)]
    pub site_id: Option<String>,
    /// Badge id → employee id.
    #[serde(default)]
    pub enrollments: HashMap<String, String>,
}

/// devices.yaml file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevicesConfig {
    /// Registered devices.
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Lookup from `(device_id, badge_id)` to employee id.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, Device>,
}

impl DeviceRegistry {
    /// Builds a registry from device definitions. Later duplicates win.
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: devices.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    /// Resolves a badge on a device to its employee.
    pub fn employee_for(&self, device_id: &str, badge_id: &str) -> Result<&str, SkipReason> {
        let device = self
            .devices
            .get(device_id)
            .ok_or_else(|| SkipReason::UnmappedDevice {
                device_id: device_id.to_string(),
            })?;
        device
            .enrollments
            .get(badge_id)
            .map(String::as_str)
            .ok_or_else(|| SkipReason::UnmappedBadge {
                device_id: device_id.to_string(),
                badge_id: badge_id.to_string(),
            })
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if no devices are registered.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Geofence settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeofencePolicy {
    /// Radius applied to sites without their own, in metres.
    pub default_radius_m: f64,
}

impl Default for GeofencePolicy {
    fn default() -> Self {
        Self {
            default_radius_m: 100.0,
        }
    }
}

/// Retry settings for optimistic-concurrency conflicts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles each retry.
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 10,
        }
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconciliationPolicy {
    /// Allowed difference between self-report and biometric durations.
    pub mismatch_tolerance_minutes: i64,
    /// Conflict retry policy.
    pub retry: RetryPolicy,
}

impl ReconciliationPolicy {
    /// The tolerance expressed in hours.
    pub fn tolerance_hours(&self) -> Decimal {
        Decimal::new(self.mismatch_tolerance_minutes.max(0), 0) / Decimal::new(60, 0)
    }
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        Self {
            mismatch_tolerance_minutes: 30,
            retry: RetryPolicy::default(),
        }
    }
}

/// Auto-close sweep settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutoClosePolicy {
    /// Time of day on the session's date used as the forced end time.
    pub cutoff_time: NaiveTime,
    /// Seconds between sweeps.
    pub interval_secs: u64,
}

impl Default for AutoClosePolicy {
    fn default() -> Self {
        Self {
            cutoff_time: NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
            interval_secs: 900,
        }
    }
}

/// Payroll settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PayrollPolicy {
    /// Hours in a standard day; hours beyond this are overtime.
    pub standard_daily_hours: Decimal,
    /// Multiplier applied to the hourly rate for overtime.
    pub overtime_multiplier: Decimal,
    /// Attendance rate (percent) below which a result is flagged High.
    pub low_attendance_threshold: Decimal,
    /// Mismatch count above which a result is flagged High.
    pub mismatch_threshold: u32,
    /// Concurrent employees in a bulk run.
    pub worker_pool_size: usize,
    /// Allowances applied to every employee.
    pub allowances: Vec<PayComponentRule>,
    /// Deductions applied to every employee.
    pub deductions: Vec<PayComponentRule>,
    /// Holidays excluded from the default working-day count.
    pub public_holidays: Vec<PublicHoliday>,
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            standard_daily_hours: Decimal::new(8, 0),
            overtime_multiplier: Decimal::new(15, 1),
            low_attendance_threshold: Decimal::new(75, 0),
            mismatch_threshold: 3,
            worker_pool_size: 4,
            allowances: Vec::new(),
            deductions: Vec::new(),
            public_holidays: Vec::new(),
        }
    }
}

/// engine.yaml file structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Geofence settings.
    pub geofence: GeofencePolicy,
    /// Reconciliation settings.
    pub reconciliation: ReconciliationPolicy,
    /// Auto-close settings.
    pub auto_close: AutoClosePolicy,
    /// Payroll settings.
    pub payroll: PayrollPolicy,
}

/// The complete engine configuration loaded from YAML files.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    settings: EngineSettings,
    worksites: Vec<Worksite>,
    devices: DeviceRegistry,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(settings: EngineSettings, worksites: Vec<Worksite>, devices: Vec<Device>) -> Self {
        Self {
            settings,
            worksites,
            devices: DeviceRegistry::new(devices),
        }
    }

    /// Returns the policy settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the worksite registry.
    pub fn worksites(&self) -> &[Worksite] {
        &self.worksites
    }

    /// Returns the device registry.
    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }
}
