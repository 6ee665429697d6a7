//! Attendance handlers
//!
//! Thin layer: parse the path and query, pick the store handle, delegate to
//! `services::attendance` and shape rows through [`AttendanceView`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::log_handler_error;
use crate::{
    error::Result,
    extract::JsonBody,
    middleware::auth::AuthenticatedUser,
    models::attendance::{
        AttendanceListParams, AttendanceStats, AttendanceStatsParams, AttendanceView,
        SubmitAttendanceRequest, TutorSummary, UpdateAttendanceRequest,
    },
    services::attendance as attendance_services,
    state::AppState,
    validation::parse_path_id,
};

// ============================================================================
// PUBLIC LOOKUPS
// ============================================================================

/// GET /api/tutors
///
/// Distinct tutors seen in attendance records, `[{name, email}]` ordered
/// by name.
pub async fn list_tutors(State(state): State<AppState>) -> Result<Json<Vec<TutorSummary>>> {
    let tutors = attendance_services::tutors(state.stores.anon.as_ref())
        .await
        .inspect_err(|e| log_handler_error("list_tutors", e))?;
    Ok(Json(tutors))
}

/// GET /api/stats
///
/// Counts over records filtered by `tutor_name`, `student_name` and the
/// inclusive `start_date`/`end_date` window.
pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<AttendanceStatsParams>,
) -> Result<Json<AttendanceStats>> {
    let stats = attendance_services::stats(state.stores.anon.as_ref(), &params)
        .await
        .inspect_err(|e| log_handler_error("attendance_stats", e))?;
    Ok(Json(stats))
}

// ============================================================================
// RECORDS
// ============================================================================

/// GET /api/attendance
///
/// Paginated records, newest first, filtered by exact `tutor_name`,
/// `student_name` and `tutoring_date`.
pub async fn list_records(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(params): Query<AttendanceListParams>,
) -> Result<Json<serde_json::Value>> {
    let (records, pagination) =
        attendance_services::list_records(state.stores.anon.as_ref(), &params)
            .await
            .inspect_err(|e| log_handler_error("list_attendance", e))?;

    let records: Vec<AttendanceView> = records.iter().map(AttendanceView::from).collect();

    Ok(Json(serde_json::json!({
        "records": records,
        "pagination": pagination,
    })))
}

/// POST /api/attendance
///
/// Submits a record owned by the caller.
///
/// # HTTP Status Codes
/// - `201 CREATED`: the stored record
/// - `400 BAD_REQUEST`: missing field, unparseable date or time, unknown field
pub async fn submit_record(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SubmitAttendanceRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    tracing::info!(operation = "submit_attendance", user_id = %user.id, "Submitting attendance");

    let record = attendance_services::submit_record(state.stores.admin.as_ref(), request, user.id)
        .await
        .inspect_err(|e| log_handler_error("submit_attendance", e))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!(AttendanceView::from(&record))),
    ))
}

/// GET /api/records/{record_id}
pub async fn get_record(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let record_id = parse_path_id(&record_id, "Record not found")?;
    let record = attendance_services::get_record(state.stores.anon.as_ref(), record_id)
        .await
        .inspect_err(|e| log_handler_error("get_attendance", e))?;

    Ok(Json(serde_json::json!(AttendanceView::from(&record))))
}

/// PATCH /api/attendance/{record_id}
///
/// Applies only the fields present in the body and stamps `updated_at`.
pub async fn update_record(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    JsonBody(request): JsonBody<UpdateAttendanceRequest>,
) -> Result<Json<serde_json::Value>> {
    let record_id = parse_path_id(&record_id, "Record not found")?;
    tracing::info!(operation = "update_attendance", user_id = %user.id, record_id = %record_id, "Updating attendance");

    let record = attendance_services::update_record(state.stores.admin.as_ref(), record_id, request)
        .await
        .inspect_err(|e| log_handler_error("update_attendance", e))?;

    Ok(Json(serde_json::json!(AttendanceView::from(&record))))
}

/// DELETE /api/attendance/{record_id}
pub async fn delete_record(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let record_id = parse_path_id(&record_id, "Record not found")?;
    tracing::info!(operation = "delete_attendance", user_id = %user.id, record_id = %record_id, "Deleting attendance");

    attendance_services::delete_record(state.stores.admin.as_ref(), record_id)
        .await
        .inspect_err(|e| log_handler_error("delete_attendance", e))?;

    Ok(Json(serde_json::json!({
        "message": "Attendance record deleted successfully"
    })))
}
