//! Configuration loading and management for the attendance engine.
//!
//! This module loads the geofence registry, biometric device registry and
//! the reconciliation, auto-close and payroll policies from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use attendance_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Tolerance: {} minutes", config.settings().reconciliation.mismatch_tolerance_minutes);
//! ```

mod loader;
mod types;

pub(crate) use loader::load_yaml;
pub use loader::ConfigLoader;
pub use types::{
    AutoClosePolicy, Device, DeviceRegistry, DevicesConfig, EngineConfig, EngineSettings,
    GeofencePolicy, PayrollPolicy, ReconciliationPolicy, RetryPolicy, Worksite, WorksitesConfig,
};
