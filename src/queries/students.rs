use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::attendance::non_blank;
use crate::{
    error::Result,
    models::{
        pagination::PageRequest,
        students::{NewStudent, Student, StudentStatus, STUDENTS_TABLE},
    },
    store::{self, Query, Store},
};

/// Directory filters after validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentFilters {
    pub status: Option<StudentStatus>,
    pub grade: Option<String>,
    pub search: Option<String>,
}

/// Filtered directory ordered by name. Count and page fetch share it.
pub fn directory_query(filters: &StudentFilters) -> Query {
    let mut query = Query::table(STUDENTS_TABLE).order("name", true);
    if let Some(status) = filters.status {
        query = query.eq("status", status);
    }
    if let Some(grade) = non_blank(&filters.grade) {
        query = query.eq("grade", grade);
    }
    if let Some(search) = non_blank(&filters.search) {
        query = query.ilike("name", format!("%{}%", search));
    }
    query
}

pub async fn list_students(
    store: &dyn Store,
    filters: &StudentFilters,
    page: PageRequest,
) -> Result<(Vec<Student>, u64)> {
    let query = directory_query(filters);
    let total = store.count(&query).await?;
    let students = store::select_as(store, &query.range(page.offset(), page.limit)).await?;
    Ok((students, total))
}

pub async fn get_student(store: &dyn Store, id: Uuid) -> Result<Option<Student>> {
    store::select_one(store, &Query::table(STUDENTS_TABLE).eq("id", id)).await
}

pub async fn create_student(store: &dyn Store, student: NewStudent) -> Result<Student> {
    store::insert_as(store, STUDENTS_TABLE, student).await
}

pub async fn update_student(store: &dyn Store, id: Uuid, patch: Value) -> Result<Option<Student>> {
    store::update_one(store, &Query::table(STUDENTS_TABLE).eq("id", id), patch).await
}

pub async fn delete_student(store: &dyn Store, id: Uuid) -> Result<bool> {
    let removed = store.delete(&Query::table(STUDENTS_TABLE).eq("id", id)).await?;
    Ok(!removed.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct StatusGradeRow {
    #[serde(default)]
    pub status: Option<StudentStatus>,
    #[serde(default)]
    pub grade: Option<String>,
}

pub async fn status_grade_rows(store: &dyn Store) -> Result<Vec<StatusGradeRow>> {
    store::select_as(store, &Query::table(STUDENTS_TABLE).select("status,grade")).await
}
