//! Student directory operations.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::attendance::{now_timestamp, round2};
use crate::{
    error::{Error, Result},
    models::{
        pagination::{PageRequest, Pagination},
        students::{
            CreateStudentRequest, NewStudent, Student, StudentListParams, StudentStats,
            StudentStatus, UpdateStudentRequest, UNKNOWN_GRADE,
        },
    },
    queries::students::{self as queries, StudentFilters},
    store::Store,
    validation::{require_field, require_non_null},
};

fn parse_filters(params: &StudentListParams) -> Result<StudentFilters> {
    let status = match params.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(StudentStatus::from_str(raw).map_err(|_| {
            Error::InvalidParameter(format!("Invalid status '{}': expected active or inactive", raw))
        })?),
        None => None,
    };
    Ok(StudentFilters {
        status,
        grade: params.grade.clone(),
        search: params.search.clone(),
    })
}

pub async fn list_students(
    store: &dyn Store,
    params: &StudentListParams,
) -> Result<(Vec<Student>, Pagination)> {
    let page = PageRequest::parse(params.page.as_deref(), params.limit.as_deref())?;
    let filters = parse_filters(params)?;
    let (students, total) = queries::list_students(store, &filters, page).await?;
    Ok((students, page.paginate(total)))
}

pub async fn get_student(store: &dyn Store, id: Uuid) -> Result<Student> {
    queries::get_student(store, id)
        .await?
        .ok_or_else(|| Error::NotFound("Student not found".to_string()))
}

pub async fn create_student(store: &dyn Store, request: CreateStudentRequest) -> Result<Student> {
    let name = require_field(request.name, "name")?;
    let grade = request.grade.map(|g| g.trim().to_string()).filter(|g| !g.is_empty());

    let student = queries::create_student(
        store,
        NewStudent {
            name,
            grade,
            status: request.status.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(operation = "create_student", student_id = %student.id, "Student created");
    Ok(student)
}

pub fn build_patch(request: UpdateStudentRequest) -> Result<Map<String, Value>> {
    let mut patch = Map::new();

    if let Some(value) = request.name {
        patch.insert("name".into(), require_non_null(value, "name")?.into());
    }
    if let Some(value) = request.grade {
        patch.insert("grade".into(), value.map_or(Value::Null, Value::String));
    }
    if let Some(value) = request.status {
        let status = value.ok_or_else(|| Error::InvalidParameter("status cannot be null".to_string()))?;
        patch.insert("status".into(), Value::String(status.to_string()));
    }

    patch.insert("updated_at".into(), now_timestamp());
    Ok(patch)
}

pub async fn update_student(store: &dyn Store, id: Uuid, request: UpdateStudentRequest) -> Result<Student> {
    let patch = build_patch(request)?;
    let student = queries::update_student(store, id, Value::Object(patch))
        .await?
        .ok_or_else(|| Error::NotFound("Student not found".to_string()))?;

    tracing::info!(operation = "update_student", student_id = %id, "Student updated");
    Ok(student)
}

pub async fn delete_student(store: &dyn Store, id: Uuid) -> Result<()> {
    if !queries::delete_student(store, id).await? {
        return Err(Error::NotFound("Student not found".to_string()));
    }
    tracing::info!(operation = "delete_student", student_id = %id, "Student deleted");
    Ok(())
}

pub async fn stats(store: &dyn Store) -> Result<StudentStats> {
    let rows = queries::status_grade_rows(store).await?;

    let total = rows.len() as u64;
    let active = rows.iter().filter(|r| r.status == Some(StudentStatus::Active)).count() as u64;
    let inactive = rows.iter().filter(|r| r.status == Some(StudentStatus::Inactive)).count() as u64;

    let mut grade_stats = BTreeMap::new();
    for row in &rows {
        let grade = row
            .grade
            .as_deref()
            .filter(|g| !g.is_empty())
            .unwrap_or(UNKNOWN_GRADE);
        *grade_stats.entry(grade.to_string()).or_insert(0) += 1;
    }

    let active_rate = if total > 0 {
        round2(active as f64 / total as f64 * 100.0)
    } else {
        0.0
    };

    Ok(StudentStats {
        total,
        active,
        inactive,
        active_rate,
        grade_stats,
    })
}
