use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        attendance::{
            AttendanceListParams, AttendanceRecord, AttendanceStatsParams, NewAttendance,
            ATTENDANCE_TABLE,
        },
        pagination::PageRequest,
    },
    store::{self, Query, Store},
};

/// Treats blank query values as absent.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Filtered listing, newest first. Shared by the count and the page fetch.
pub fn list_query(params: &AttendanceListParams) -> Query {
    Query::table(ATTENDANCE_TABLE)
        .eq_opt("tutor_name", non_blank(&params.tutor_name))
        .eq_opt("student_name", non_blank(&params.student_name))
        .eq_opt("tutoring_date", non_blank(&params.tutoring_date))
        .order("timestamp", false)
}

pub fn stats_query(params: &AttendanceStatsParams) -> Query {
    let mut query = Query::table(ATTENDANCE_TABLE)
        .select("tutoring_date,tutor_name,student_name")
        .eq_opt("tutor_name", non_blank(&params.tutor_name))
        .eq_opt("student_name", non_blank(&params.student_name));
    if let Some(start) = non_blank(&params.start_date) {
        query = query.gte("tutoring_date", start);
    }
    if let Some(end) = non_blank(&params.end_date) {
        query = query.lte("tutoring_date", end);
    }
    query
}

/// Returns one page of records and the total matching the same filters.
pub async fn list_records(
    store: &dyn Store,
    params: &AttendanceListParams,
    page: PageRequest,
) -> Result<(Vec<AttendanceRecord>, u64)> {
    let query = list_query(params);
    let total = store.count(&query).await?;
    let records = store::select_as(store, &query.range(page.offset(), page.limit)).await?;
    Ok((records, total))
}

pub async fn create_record(store: &dyn Store, record: NewAttendance) -> Result<AttendanceRecord> {
    store::insert_as(store, ATTENDANCE_TABLE, record).await
}

pub async fn get_record(store: &dyn Store, record_id: Uuid) -> Result<Option<AttendanceRecord>> {
    store::select_one(store, &Query::table(ATTENDANCE_TABLE).eq("record_id", record_id)).await
}

/// Applies `patch` and returns the updated row, or `None` when no row matched.
pub async fn update_record(
    store: &dyn Store,
    record_id: Uuid,
    patch: Value,
) -> Result<Option<AttendanceRecord>> {
    store::update_one(store, &Query::table(ATTENDANCE_TABLE).eq("record_id", record_id), patch).await
}

/// Returns whether a row was removed.
pub async fn delete_record(store: &dyn Store, record_id: Uuid) -> Result<bool> {
    let removed = store
        .delete(&Query::table(ATTENDANCE_TABLE).eq("record_id", record_id))
        .await?;
    Ok(!removed.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct StatsRow {
    pub tutor_name: String,
    pub student_name: String,
}

pub async fn stats_rows(store: &dyn Store, params: &AttendanceStatsParams) -> Result<Vec<StatsRow>> {
    store::select_as(store, &stats_query(params)).await
}

#[derive(Debug, Deserialize)]
pub struct TutorRow {
    pub tutor_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

pub async fn tutor_rows(store: &dyn Store) -> Result<Vec<TutorRow>> {
    let query = Query::table(ATTENDANCE_TABLE)
        .select("tutor_name,email")
        .order("tutor_name", true);
    store::select_as(store, &query).await
}

#[derive(Debug, Deserialize)]
pub struct StudentNameRow {
    pub student_name: String,
}

pub async fn student_name_rows(store: &dyn Store) -> Result<Vec<StudentNameRow>> {
    let query = Query::table(ATTENDANCE_TABLE)
        .select("student_name")
        .order("student_name", true);
    store::select_as(store, &query).await
}
