//! Attendance reconciliation and payroll engine.
//!
//! This crate tracks employee workdays through a start/end lifecycle with
//! geofenced location checks, merges self-reported sessions with biometric
//! punch data into one daily attendance record, and computes monthly salary
//! with an audit trace from the reconciled records.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod models;
pub mod sources;
pub mod store;
