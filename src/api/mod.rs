//! HTTP API for the attendance engine.
//!
//! Exposes the session lifecycle, live attendance, biometric upload,
//! salary and progress operations as JSON endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    BiometricUploadRequest, BulkSalaryRequest, EndDayRequest, LiveAttendanceQuery,
    LocationRequest, ProgressRequest, SalaryRequest, StartDayRequest,
};
pub use response::{ApiError, ApiErrorResponse, LiveAttendanceResponse};
pub use state::AppState;
