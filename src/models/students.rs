use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::deserialize_some;
use crate::services::timezone::to_jakarta_time;

pub const STUDENTS_TABLE: &str = "students";

/// Grade bucket for students without a grade.
pub const UNKNOWN_GRADE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub status: StudentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewStudent {
    pub name: String,
    pub grade: Option<String>,
    pub status: StudentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateStudentRequest {
    pub name: Option<String>,
    pub grade: Option<String>,
    pub status: Option<StudentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStudentRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub grade: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub status: Option<Option<StudentStatus>>,
}

/// Query string of `GET /api/students`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub grade: Option<String>,
    pub search: Option<String>,
}

impl StudentListParams {
    /// True when any directory parameter is present.
    pub fn wants_directory(&self) -> bool {
        self.page.is_some()
            || self.limit.is_some()
            || self.status.is_some()
            || self.grade.is_some()
            || self.search.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    #[serde(rename = "activeRate")]
    pub active_rate: f64,
    #[serde(rename = "gradeStats")]
    pub grade_stats: BTreeMap<String, u64>,
}

/// Public projection of a [`Student`], timestamps at +07:00.
#[derive(Debug, Serialize)]
pub struct StudentView<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub grade: Option<&'a str>,
    pub status: StudentStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl<'a> From<&'a Student> for StudentView<'a> {
    fn from(student: &'a Student) -> Self {
        Self {
            id: student.id,
            name: &student.name,
            grade: student.grade.as_deref(),
            status: student.status,
            created_at: student.created_at.map(to_jakarta_time),
            updated_at: student.updated_at.map(to_jakarta_time),
        }
    }
}
