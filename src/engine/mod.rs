//! Stateful engine components.
//!
//! These services read and write the [`crate::store::AttendanceStore`],
//! consult the collaborator sources and delegate the rules themselves to
//! [`crate::calculation`]. [`AttendanceService`] wires them together.

mod auto_close;
mod ingest;
mod payroll;
mod progress_gate;
mod reconcile;
mod service;
mod session;

pub use auto_close::{AutoCloser, SweepFailure, SweepReport};
pub use ingest::{BiometricIngestor, KeyError, UploadReport};
pub use payroll::SalaryCalculator;
pub use progress_gate::ProgressGate;
pub use reconcile::ReconciliationEngine;
pub use service::{AttendanceService, Collaborators, LiveAttendanceEntry, LiveAttendanceFilter};
pub use session::{ClosedDay, SessionStateMachine};
