// Core data structures for the host-rotation scheduler

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix used for the synthesized id of a session's teacher row
pub const TEACHER_ID_PREFIX: &str = "teacher-";

/// Identifier of a host candidate
///
/// Either an enrollment id or a synthesized `teacher-<teacher id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    /// Id for an enrollment row
    pub fn enrollment(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthesized id for a course teacher
    pub fn teacher(teacher_id: &str) -> Self {
        Self(format!("{TEACHER_ID_PREFIX}{teacher_id}"))
    }

    /// Whether this id was synthesized for a teacher
    pub fn is_teacher(&self) -> bool {
        self.0.starts_with(TEACHER_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One row of the host rotation: a student enrollment or the course teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostCandidate {
    pub id: CandidateId,
    pub display_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Always true for the teacher row
    pub can_host: bool,
    pub assigned_date: Option<NaiveDate>,
    pub is_teacher: bool,
}

impl HostCandidate {
    /// Candidate built from an enrollment record
    pub fn from_enrollment(record: &EnrollmentRecord) -> Self {
        Self {
            id: CandidateId::enrollment(record.id.clone()),
            display_name: record.student_name.clone(),
            address: record.address.clone(),
            phone: record.phone.clone(),
            can_host: record.can_host,
            assigned_date: record.host_date,
            is_teacher: false,
        }
    }

    /// Synthetic teacher row for a session
    pub fn teacher(session: &SessionRecord, assigned_date: Option<NaiveDate>) -> Self {
        Self {
            id: CandidateId::teacher(&session.teacher_id),
            display_name: session.teacher_name.clone(),
            address: session.teacher_address.clone(),
            phone: session.teacher_phone.clone(),
            can_host: true,
            assigned_date,
            is_teacher: true,
        }
    }

    /// Address present and not just whitespace
    pub fn has_usable_address(&self) -> bool {
        self.address
            .as_deref()
            .map(|a| !a.trim().is_empty())
            .unwrap_or(false)
    }
}

/// A recurring session of a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub course_name: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub teacher_address: Option<String>,
    pub teacher_phone: Option<String>,
    /// Kept as entered; parsed leniently when the window is expanded
    pub start_date: String,
    pub end_date: String,
    /// Free-text weekday list, e.g. "Mon, Wed"
    pub day_filter: Option<String>,
}

/// Enrollment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Inactive,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown enrollment status '{other}'")),
        }
    }
}

impl Default for EnrollmentStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Enrollment of a student in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub id: String,
    pub session_id: String,
    pub student_id: String,
    pub student_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub status: EnrollmentStatus,
    pub can_host: bool,
    pub host_date: Option<NaiveDate>,
}

/// Attendance row; cancellation markers are attendance rows too
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub session_id: String,
    pub enrollment_id: String,
    pub date: NaiveDate,
    pub status: String,
    pub host_address: Option<String>,
}

/// Host-address value that marks an attendance row as "session not held"
pub const SESSION_CANCELLED_MARKER: &str = "SESSION_CANCELLED";

/// Attendance status written on cancellation markers
pub const EXCUSED_STATUS: &str = "excused";

impl AttendanceRecord {
    /// Marker row for a cancelled session date
    pub fn cancellation_marker(session_id: &str, enrollment_id: &str, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            enrollment_id: enrollment_id.to_string(),
            date,
            status: EXCUSED_STATUS.to_string(),
            host_address: Some(SESSION_CANCELLED_MARKER.to_string()),
        }
    }

    pub fn is_cancellation_marker(&self) -> bool {
        self.host_address.as_deref() == Some(SESSION_CANCELLED_MARKER)
    }
}

/// Audit trail entry written for irreversible deletes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub action: String,
    pub table_name: String,
    pub record_id: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// New entry stamped with a fresh id and the current time
    pub fn new(
        action: impl Into<String>,
        table_name: impl Into<String>,
        record_id: impl Into<String>,
        details: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action: action.into(),
            table_name: table_name.into(),
            record_id: record_id.into(),
            details,
            created_at: Utc::now(),
        }
    }
}
