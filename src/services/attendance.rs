//! Attendance record operations.

use std::collections::HashSet;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::{
        attendance::{
            AttendanceListParams, AttendanceRecord, AttendanceStats, AttendanceStatsParams,
            NewAttendance, StudentName, SubmitAttendanceRequest, TutorSummary,
            UpdateAttendanceRequest,
        },
        pagination::{PageRequest, Pagination},
    },
    queries::attendance as queries,
    store::Store,
    validation::{require_field, require_non_null, validate_tutoring_date, validate_tutoring_time},
};

/// Days the per-day average is spread over.
pub const STATS_WINDOW_DAYS: f64 = 30.0;

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn now_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list_records(
    store: &dyn Store,
    params: &AttendanceListParams,
) -> Result<(Vec<AttendanceRecord>, Pagination)> {
    let page = PageRequest::parse(params.page.as_deref(), params.limit.as_deref())?;
    let (records, total) = queries::list_records(store, params, page).await?;
    Ok((records, page.paginate(total)))
}

/// Validates and stores a new record owned by `created_by`.
///
/// Every check runs before the store is touched.
pub async fn submit_record(
    store: &dyn Store,
    request: SubmitAttendanceRequest,
    created_by: Uuid,
) -> Result<AttendanceRecord> {
    let tutor_name = require_field(request.tutor_name, "tutor_name")?;
    let tutoring_date = require_field(request.tutoring_date, "tutoring_date")?;
    let tutoring_time = require_field(request.tutoring_time, "tutoring_time")?;
    let student_name = require_field(request.student_name, "student_name")?;

    validate_tutoring_date(&tutoring_date)?;
    validate_tutoring_time(&tutoring_time)?;

    let record = queries::create_record(
        store,
        NewAttendance {
            tutor_name,
            email: blank_to_none(request.email),
            tutoring_date,
            tutoring_time,
            student_name,
            proof_of_teaching: blank_to_none(request.proof_of_teaching),
            created_by,
        },
    )
    .await?;

    tracing::info!(operation = "submit_attendance", record_id = %record.record_id, created_by = %created_by, "Attendance submitted");
    Ok(record)
}

pub async fn get_record(store: &dyn Store, record_id: Uuid) -> Result<AttendanceRecord> {
    queries::get_record(store, record_id)
        .await?
        .ok_or_else(|| Error::NotFound("Record not found".to_string()))
}

/// Builds the column patch for a sparse update. `updated_at` is always set.
pub fn build_patch(request: UpdateAttendanceRequest) -> Result<Map<String, Value>> {
    let mut patch = Map::new();

    if let Some(value) = request.tutor_name {
        patch.insert("tutor_name".into(), require_non_null(value, "tutor_name")?.into());
    }
    if let Some(value) = request.tutoring_date {
        let date = require_non_null(value, "tutoring_date")?;
        validate_tutoring_date(&date)?;
        patch.insert("tutoring_date".into(), date.into());
    }
    if let Some(value) = request.tutoring_time {
        let time = require_non_null(value, "tutoring_time")?;
        validate_tutoring_time(&time)?;
        patch.insert("tutoring_time".into(), time.into());
    }
    if let Some(value) = request.student_name {
        patch.insert("student_name".into(), require_non_null(value, "student_name")?.into());
    }
    if let Some(value) = request.email {
        patch.insert("email".into(), value.map_or(Value::Null, Value::String));
    }
    if let Some(value) = request.proof_of_teaching {
        patch.insert("proof_of_teaching".into(), value.map_or(Value::Null, Value::String));
    }

    patch.insert("updated_at".into(), now_timestamp());
    Ok(patch)
}

pub async fn update_record(
    store: &dyn Store,
    record_id: Uuid,
    request: UpdateAttendanceRequest,
) -> Result<AttendanceRecord> {
    let patch = build_patch(request)?;
    let fields: Vec<String> = patch.keys().cloned().collect();

    let record = queries::update_record(store, record_id, Value::Object(patch))
        .await?
        .ok_or_else(|| Error::NotFound("Record not found".to_string()))?;

    tracing::info!(operation = "update_attendance", record_id = %record_id, fields = ?fields, "Attendance updated");
    Ok(record)
}

pub async fn delete_record(store: &dyn Store, record_id: Uuid) -> Result<()> {
    if !queries::delete_record(store, record_id).await? {
        return Err(Error::NotFound("Record not found".to_string()));
    }
    tracing::info!(operation = "delete_attendance", record_id = %record_id, "Attendance deleted");
    Ok(())
}

pub async fn stats(store: &dyn Store, params: &AttendanceStatsParams) -> Result<AttendanceStats> {
    let rows = queries::stats_rows(store, params).await?;

    let total = rows.len() as u64;
    let tutors: HashSet<&str> = rows.iter().map(|r| r.tutor_name.as_str()).collect();
    let students: HashSet<&str> = rows.iter().map(|r| r.student_name.as_str()).collect();

    Ok(AttendanceStats {
        total,
        unique_tutors: tutors.len() as u64,
        unique_students: students.len() as u64,
        average_per_day: round2(total as f64 / STATS_WINDOW_DAYS),
    })
}

/// Distinct tutors by name, keeping the first email seen, ordered by name.
pub async fn tutors(store: &dyn Store) -> Result<Vec<TutorSummary>> {
    let rows = queries::tutor_rows(store).await?;
    let mut seen = HashSet::new();
    Ok(rows
        .into_iter()
        .filter(|row| seen.insert(row.tutor_name.clone()))
        .map(|row| TutorSummary {
            name: row.tutor_name,
            email: row.email,
        })
        .collect())
}

/// Distinct student names found in attendance records, ordered by name.
pub async fn unique_students(store: &dyn Store) -> Result<Vec<StudentName>> {
    let rows = queries::student_name_rows(store).await?;
    let mut seen = HashSet::new();
    Ok(rows
        .into_iter()
        .filter(|row| seen.insert(row.student_name.clone()))
        .map(|row| StudentName {
            name: row.student_name,
        })
        .collect())
}
