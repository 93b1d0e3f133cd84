//! HTTP request handlers for the attendance API.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;

use super::request::{
    BiometricUploadRequest, BulkSalaryRequest, EndDayRequest, LiveAttendanceQuery,
    ProgressRequest, SalaryRequest, StartDayRequest,
};
use super::response::{ApiError, ApiErrorResponse, LiveAttendanceResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/attendance/start", post(start_day_handler))
        .route("/attendance/end", post(end_day_handler))
        .route("/attendance/live", get(live_attendance_handler))
        .route("/biometric/upload", post(biometric_upload_handler))
        .route("/salary/calculate", post(salary_handler))
        .route("/salary/bulk", post(bulk_salary_handler))
        .route("/progress", post(progress_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn engine_error_response(correlation_id: Uuid, error: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %error,
        client_correctable = error.is_client_correctable(),
        "Request failed"
    );
    ApiErrorResponse::from(error).into_response()
}

fn json_rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

/// Handler for POST /attendance/start.
async fn start_day_handler(
    State(state): State<AppState>,
    payload: Result<Json<StartDayRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };
    info!(
        correlation_id = %correlation_id,
        employee_id = %request.employee_id,
        "Processing start-day request"
    );

    match state
        .service()
        .start_day(
            &request.employee_id,
            request.date,
            request.location.into(),
            request.work_location,
        )
        .await
    {
        Ok(session) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %session.employee_id,
                date = %session.date,
                work_location = ?session.work_location,
                "Day started"
            );
            json_response(StatusCode::CREATED, session)
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /attendance/end.
async fn end_day_handler(
    State(state): State<AppState>,
    payload: Result<Json<EndDayRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };
    info!(
        correlation_id = %correlation_id,
        employee_id = %request.employee_id,
        "Processing end-day request"
    );

    match state
        .service()
        .end_day(
            &request.employee_id,
            request.date,
            request.location.map(Into::into),
        )
        .await
    {
        Ok(closed) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %closed.session.employee_id,
                date = %closed.session.date,
                hours_worked = %closed.record.hours_worked,
                "Day ended"
            );
            json_response(StatusCode::OK, closed)
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for GET /attendance/live.
async fn live_attendance_handler(
    State(state): State<AppState>,
    query: Result<Query<LiveAttendanceQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!(
                correlation_id = %correlation_id,
                error = %rejection.body_text(),
                "Query string error"
            );
            return json_response(
                StatusCode::BAD_REQUEST,
                ApiError::validation_error(rejection.body_text()),
            );
        }
    };

    let (date, filter) = query.into_parts();
    let date = date.unwrap_or_else(|| state.service().today());

    match state.service().live_attendance(date, &filter).await {
        Ok(entries) => {
            info!(
                correlation_id = %correlation_id,
                date = %date,
                entries = entries.len(),
                "Live attendance served"
            );
            json_response(StatusCode::OK, LiveAttendanceResponse { date, entries })
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /biometric/upload.
async fn biometric_upload_handler(
    State(state): State<AppState>,
    payload: Result<Json<BiometricUploadRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };
    info!(
        correlation_id = %correlation_id,
        rows = request.rows.len(),
        "Processing biometric upload"
    );

    match state
        .service()
        .upload_biometric(&request.rows, request.source_file_id)
        .await
    {
        Ok(report) => json_response(StatusCode::OK, report),
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /salary/calculate.
async fn salary_handler(
    State(state): State<AppState>,
    payload: Result<Json<SalaryRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };
    let period = match request.period() {
        Ok(period) => period,
        Err(err) => return engine_error_response(correlation_id, err),
    };

    let start_time = Instant::now();
    match state
        .service()
        .calculate_salary(&request.employee_id, period, request.working_days)
        .await
    {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %result.employee_id,
                period = %result.period,
                net_pay = %result.net_pay,
                duration_us = start_time.elapsed().as_micros(),
                "Salary calculated"
            );
            json_response(StatusCode::OK, result)
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /salary/bulk.
///
/// A server shutdown cancels the run; employees not yet started are listed
/// in the response.
async fn bulk_salary_handler(
    State(state): State<AppState>,
    payload: Result<Json<BulkSalaryRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };
    let period = match request.period() {
        Ok(period) => period,
        Err(err) => return engine_error_response(correlation_id, err),
    };
    info!(
        correlation_id = %correlation_id,
        period = %period,
        "Processing bulk salary request"
    );

    let start_time = Instant::now();
    match state
        .service()
        .calculate_bulk_salary(period, request.working_days, state.shutdown().child_token())
        .await
    {
        Ok(outcome) => {
            info!(
                correlation_id = %correlation_id,
                successes = outcome.successes.len(),
                failures = outcome.failures.len(),
                not_started = outcome.not_started.len(),
                duration_us = start_time.elapsed().as_micros(),
                "Bulk salary run finished"
            );
            json_response(StatusCode::OK, outcome)
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /progress.
async fn progress_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let entry = request.into_entry(state.service().today());
    match state.service().record_progress(entry.clone()).await {
        Ok(()) => json_response(StatusCode::CREATED, entry),
        Err(err) => engine_error_response(correlation_id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::ConfigLoader;
    use crate::engine::{AttendanceService, Collaborators};
    use crate::events::BroadcastEventSink;
    use crate::models::{SessionStatus, WorkSession};
    use crate::sources::{InMemoryLeave, InMemoryProgress, InMemoryRoster};
    use crate::store::InMemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDateTime;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config/default").expect("Failed to load config");
        let roster = InMemoryRoster::load("./config/default/roster.yaml").unwrap();
        let clock = FixedClock::new(
            NaiveDateTime::parse_from_str("2026-03-02 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
        );
        let service = AttendanceService::new(
            config.config().clone(),
            Collaborators {
                store: Arc::new(InMemoryStore::new()),
                roster: Arc::new(roster),
                leave: Arc::new(InMemoryLeave::default()),
                progress: Arc::new(InMemoryProgress::new()),
                events: Arc::new(BroadcastEventSink::default()),
                clock: Arc::new(clock),
            },
        );
        AppState::new(service, CancellationToken::new())
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_api_001_start_in_office_returns_201() {
        let router = create_router(create_test_state());
        let body = r#"{
            "employee_id": "emp_001",
            "location": {"latitude": 23.7810, "longitude": 90.4069, "accuracy_m": 10}
        }"#;

        let response = router.oneshot(post("/attendance/start", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        let session: WorkSession = body_json(response).await;
        assert_eq!(session.status, SessionStatus::InProgress);
    }

    #[tokio::test]
    async fn test_api_002_malformed_json_returns_400() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(post("/attendance/start", "{invalid json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = body_json(response).await;
        assert_eq!(error.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_api_003_missing_employee_id_returns_400() {
        let router = create_router(create_test_state());
        let body = r#"{"location": {"latitude": 23.78, "longitude": 90.40}}"#;

        let response = router.oneshot(post("/attendance/start", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = body_json(response).await;
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert!(error.message.contains("missing field"));
    }

    #[tokio::test]
    async fn test_api_004_end_without_start_returns_409() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(post("/attendance/end", r#"{"employee_id": "emp_001"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let error: ApiError = body_json(response).await;
        assert_eq!(error.code, "NOT_STARTED");
    }

    #[tokio::test]
    async fn test_api_005_bad_period_returns_400() {
        let router = create_router(create_test_state());
        let body = r#"{"employee_id": "emp_001", "month": 0, "year": 2026}"#;

        let response = router.oneshot(post("/salary/calculate", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_006_live_rejects_unknown_status() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/attendance/live?status=sleeping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
