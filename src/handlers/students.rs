//! Student directory handlers

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
    models::students::{
        CreateStudentRequest, StudentListParams, StudentStats, StudentView, UpdateStudentRequest,
    },
    services::{attendance as attendance_services, students as student_services},
    state::AppState,
    validation::parse_path_id,
};

/// GET /api/students
///
/// Without query parameters: distinct student names from attendance
/// records, `[{name}]`. With any of `page`, `limit`, `status`, `grade` or
/// `search`: the paginated directory `{students, pagination}`, ordered by
/// name, `search` matching names case-insensitively.
///
/// Public. A bearer token is optional and only attributes the read in logs;
/// a bad or stale token never turns this into a 401.
pub async fn list_students(
    viewer: Option<AuthenticatedUser>,
    State(state): State<AppState>,
    Query(params): Query<StudentListParams>,
) -> Result<Json<serde_json::Value>> {
    let store = state.stores.anon.as_ref();
    tracing::debug!(
        operation = "list_students",
        viewer = ?viewer.as_ref().map(|u| u.id),
        directory = params.wants_directory(),
        "Listing students"
    );

    if !params.wants_directory() {
        let names = attendance_services::unique_students(store)
            .await
            .inspect_err(|e| log_handler_error("list_student_names", e))?;
        return Ok(Json(serde_json::json!(names)));
    }

    let (students, pagination) = student_services::list_students(store, &params)
        .await
        .inspect_err(|e| log_handler_error("list_students", e))?;
    let students: Vec<StudentView> = students.iter().map(StudentView::from).collect();

    Ok(Json(serde_json::json!({
        "students": students,
        "pagination": pagination,
    })))
}

/// GET /api/students/stats
///
/// `{total, active, inactive, activeRate, gradeStats}`; students without a
/// grade count under `"Unknown"`.
pub async fn student_stats(State(state): State<AppState>) -> Result<Json<StudentStats>> {
    let stats = student_services::stats(state.stores.anon.as_ref())
        .await
        .inspect_err(|e| log_handler_error("student_stats", e))?;
    Ok(Json(stats))
}

/// GET /api/students/{id}
pub async fn get_student(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let id = parse_path_id(&id, "Student not found")?;
    let student = student_services::get_student(state.stores.anon.as_ref(), id)
        .await
        .inspect_err(|e| log_handler_error("get_student", e))?;

    Ok(Json(serde_json::json!(StudentView::from(&student))))
}

/// POST /api/students
///
/// # HTTP Status Codes
/// - `201 CREATED`: the stored student
/// - `400 BAD_REQUEST`: missing name, unknown status or field
pub async fn create_student(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateStudentRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    tracing::info!(operation = "create_student", user_id = %user.id, "Creating student");

    let student = student_services::create_student(state.stores.admin.as_ref(), request)
        .await
        .inspect_err(|e| log_handler_error("create_student", e))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!(StudentView::from(&student))),
    ))
}

/// PATCH /api/students/{id}
pub async fn update_student(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateStudentRequest>,
) -> Result<Json<serde_json::Value>> {
    let id = parse_path_id(&id, "Student not found")?;
    tracing::info!(operation = "update_student", user_id = %user.id, student_id = %id, "Updating student");

    let student = student_services::update_student(state.stores.admin.as_ref(), id, request)
        .await
        .inspect_err(|e| log_handler_error("update_student", e))?;

    Ok(Json(serde_json::json!(StudentView::from(&student))))
}

/// DELETE /api/students/{id}
pub async fn delete_student(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let id = parse_path_id(&id, "Student not found")?;
    tracing::info!(operation = "delete_student", user_id = %user.id, student_id = %id, "Deleting student");

    student_services::delete_student(state.stores.admin.as_ref(), id)
        .await
        .inspect_err(|e| log_handler_error("delete_student", e))?;

    Ok(Json(serde_json::json!({
        "message": "Student deleted successfully"
    })))
}
