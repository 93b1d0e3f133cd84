//! Application state for the attendance API.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::engine::AttendanceService;

/// Shared application state.
///
/// Holds the attendance service and the process-wide shutdown token that
/// long-running requests such as bulk payroll observe.
#[derive(Clone)]
pub struct AppState {
    service: Arc<AttendanceService>,
    shutdown: CancellationToken,
}

impl AppState {
    /// Creates application state around a service.
    pub fn new(service: AttendanceService, shutdown: CancellationToken) -> Self {
        Self {
            service: Arc::new(service),
            shutdown,
        }
    }

    /// Returns the attendance service.
    pub fn service(&self) -> &AttendanceService {
        &self.service
    }

    /// Returns the shutdown token.
    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }
}
