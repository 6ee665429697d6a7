use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deserialize_some;
use crate::services::timezone::to_jakarta_time;

pub const ATTENDANCE_TABLE: &str = "attendance_records";

/// Row of the `attendance_records` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub record_id: Uuid,
    /// Set by the store on insert
    pub timestamp: DateTime<Utc>,
    pub tutor_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub tutoring_date: String,
    pub tutoring_time: String,
    pub student_name: String,
    #[serde(default)]
    pub proof_of_teaching: Option<String>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload. `record_id` and `timestamp` are left to the store.
#[derive(Debug, Clone, Serialize)]
pub struct NewAttendance {
    pub tutor_name: String,
    pub email: Option<String>,
    pub tutoring_date: String,
    pub tutoring_time: String,
    pub student_name: String,
    pub proof_of_teaching: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitAttendanceRequest {
    pub tutor_name: Option<String>,
    pub email: Option<String>,
    pub tutoring_date: Option<String>,
    pub tutoring_time: Option<String>,
    pub student_name: Option<String>,
    pub proof_of_teaching: Option<String>,
}

/// Sparse update. The outer `Option` tells absent from present; the inner
/// one carries an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAttendanceRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub tutor_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub tutoring_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub tutoring_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub student_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub proof_of_teaching: Option<Option<String>>,
}

/// Query string of `GET /api/attendance`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceListParams {
    pub tutor_name: Option<String>,
    pub student_name: Option<String>,
    pub tutoring_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Query string of `GET /api/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceStatsParams {
    pub tutor_name: Option<String>,
    pub student_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceStats {
    pub total: u64,
    #[serde(rename = "uniqueTutors")]
    pub unique_tutors: u64,
    #[serde(rename = "uniqueStudents")]
    pub unique_students: u64,
    #[serde(rename = "averagePerDay")]
    pub average_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TutorSummary {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentName {
    pub name: String,
}

/// Public projection of an [`AttendanceRecord`], timestamps at +07:00.
#[derive(Debug, Serialize)]
pub struct AttendanceView<'a> {
    pub record_id: Uuid,
    pub timestamp: String,
    pub tutor_name: &'a str,
    pub email: Option<&'a str>,
    pub tutoring_date: &'a str,
    pub tutoring_time: &'a str,
    pub student_name: &'a str,
    pub proof_of_teaching: Option<&'a str>,
    pub created_by: Option<Uuid>,
    pub updated_at: Option<String>,
}

impl<'a> From<&'a AttendanceRecord> for AttendanceView<'a> {
    fn from(record: &'a AttendanceRecord) -> Self {
        Self {
            record_id: record.record_id,
            timestamp: to_jakarta_time(record.timestamp),
            tutor_name: &record.tutor_name,
            email: record.email.as_deref(),
            tutoring_date: &record.tutoring_date,
            tutoring_time: &record.tutoring_time,
            student_name: &record.student_name,
            proof_of_teaching: record.proof_of_teaching.as_deref(),
            created_by: record.created_by,
            updated_at: record.updated_at.map(to_jakarta_time),
        }
    }
}
