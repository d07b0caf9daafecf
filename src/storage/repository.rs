//! Repository Pattern for the host record store
//!
//! The scheduler reads and writes sessions, enrollments, teacher host dates,
//! cancellation markers and audit entries through the
//! [`HostRecordRepository`] trait, so the storage backend can be swapped:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 HostRotation / import / CLI                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  HostRecordRepository                       │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                             │
//!                  ▼                             ▼
//!        ┌─────────────────┐           ┌─────────────────┐
//!        │     SQLite      │           │      Mock       │
//!        │  Implementation │           │ Implementation  │
//!        └─────────────────┘           └─────────────────┘
//! ```
//!
//! Every write is a single independent statement. Nothing is grouped into
//! transactions, which mirrors the hosted table API these records come from.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hostrota::storage::repository::{HostRecordRepository, SqliteHostRepository};
//!
//! // Production: use SQLite
//! let repo = SqliteHostRepository::new("data/hostrota.db")?;
//!
//! // Testing: use Mock
//! let mock_repo = MockHostRepository::new();
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::broadcast;

use super::events::{ChangeFeed, StoreEvent};
use crate::models::{
    AttendanceRecord, AuditEntry, EnrollmentRecord, EnrollmentStatus, SessionRecord,
    EXCUSED_STATUS, SESSION_CANCELLED_MARKER,
};
use crate::scheduler::calendar::{format_date, parse_calendar_date};

// ============================================================================
// Core Types
// ============================================================================

/// Per-enrollment result of writing cancellation markers
#[derive(Debug, Default)]
pub struct MarkOutcome {
    /// Enrollments whose marker landed
    pub written: Vec<String>,
    /// Enrollments whose marker write failed, with the cause
    pub failed: Vec<(String, anyhow::Error)>,
}

impl MarkOutcome {
    /// True when no marker write failed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of an enrollment upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Another enrollment already holds this (session, student) pair
    Duplicate,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
            Self::Duplicate => "duplicate",
        }
    }
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Record store used by the host-rotation scheduler
pub trait HostRecordRepository: Send + Sync {
    /// Get a session by id
    fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    /// Insert or replace a session
    fn upsert_session(&self, session: &SessionRecord) -> Result<()>;

    /// Active enrollments of a session, ordered by student name
    fn list_active_enrollments(&self, session_id: &str) -> Result<Vec<EnrollmentRecord>>;

    /// Insert or update an enrollment by id
    ///
    /// A (session, student) unique violation is reported as
    /// [`UpsertOutcome::Duplicate`] instead of an error.
    fn upsert_enrollment(&self, record: &EnrollmentRecord) -> Result<UpsertOutcome>;

    /// Update an enrollment's can-host flag
    fn set_enrollment_can_host(&self, enrollment_id: &str, can_host: bool) -> Result<()>;

    /// Set or clear an enrollment's host date
    fn set_enrollment_host_date(&self, enrollment_id: &str, date: Option<NaiveDate>)
        -> Result<()>;

    /// Teacher's own host date for a session
    fn get_teacher_host_date(&self, teacher_id: &str, session_id: &str)
        -> Result<Option<NaiveDate>>;

    /// Insert or update the teacher's host date
    fn upsert_teacher_host_date(
        &self,
        teacher_id: &str,
        session_id: &str,
        date: NaiveDate,
    ) -> Result<()>;

    /// Remove the teacher's host date; returns whether a row existed
    fn delete_teacher_host_date(&self, teacher_id: &str, session_id: &str) -> Result<bool>;

    /// Dates carrying cancellation markers for a session
    fn cancelled_dates(&self, session_id: &str) -> Result<BTreeSet<NaiveDate>>;

    /// Write one cancellation marker per enrollment
    ///
    /// Each marker is written on its own; a failed enrollment does not stop
    /// the remaining ones. The outcome lists both sides.
    fn mark_date_cancelled(
        &self,
        session_id: &str,
        date: NaiveDate,
        enrollment_ids: &[String],
    ) -> MarkOutcome;

    /// Delete the cancellation markers of a date; returns the deleted rows
    fn unmark_date_cancelled(&self, session_id: &str, date: NaiveDate)
        -> Result<Vec<AttendanceRecord>>;

    /// Append an audit entry
    fn append_audit(&self, entry: &AuditEntry) -> Result<()>;

    /// Most recent audit entries first
    fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>>;

    /// Subscribe to change notifications
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of HostRecordRepository
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteHostRepository {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
}

impl SqliteHostRepository {
    /// Create a new SQLite repository
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open SQLite database")?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
            feed: ChangeFeed::default(),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite repository initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory SQLite")?;
        let repo = Self {
            conn: Mutex::new(conn),
            feed: ChangeFeed::default(),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    /// Create database schema
    fn create_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS sessions (
                    id TEXT PRIMARY KEY,
                    course_name TEXT NOT NULL,
                    teacher_id TEXT NOT NULL,
                    teacher_name TEXT NOT NULL,
                    teacher_address TEXT,
                    teacher_phone TEXT,
                    start_date TEXT NOT NULL,
                    end_date TEXT NOT NULL,
                    day_filter TEXT,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS enrollments (
                    id TEXT PRIMARY KEY,
                    session_id TEXT NOT NULL,
                    student_id TEXT NOT NULL,
                    student_name TEXT NOT NULL,
                    address TEXT,
                    phone TEXT,
                    status TEXT NOT NULL DEFAULT 'active',
                    can_host INTEGER NOT NULL DEFAULT 0,
                    host_date TEXT,
                    UNIQUE (session_id, student_id)
                );

                CREATE INDEX IF NOT EXISTS idx_enrollments_session
                    ON enrollments(session_id, status);

                CREATE TABLE IF NOT EXISTS teacher_hosts (
                    teacher_id TEXT NOT NULL,
                    session_id TEXT NOT NULL,
                    host_date TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (teacher_id, session_id)
                );

                CREATE TABLE IF NOT EXISTS attendance (
                    id TEXT PRIMARY KEY,
                    session_id TEXT NOT NULL,
                    enrollment_id TEXT NOT NULL,
                    date TEXT NOT NULL,
                    status TEXT NOT NULL,
                    host_address TEXT,
                    UNIQUE (enrollment_id, date)
                );

                CREATE INDEX IF NOT EXISTS idx_attendance_session_date
                    ON attendance(session_id, date);

                CREATE TABLE IF NOT EXISTS audit_log (
                    id TEXT PRIMARY KEY,
                    action TEXT NOT NULL,
                    table_name TEXT NOT NULL,
                    record_id TEXT NOT NULL,
                    details TEXT,
                    created_at TEXT NOT NULL
                );
                "#,
        )
        .context("Failed to create SQLite schema")?;

        Ok(())
    }

    fn enrollment_session(conn: &Connection, enrollment_id: &str) -> Result<String> {
        conn.query_row(
            "SELECT session_id FROM enrollments WHERE id = ?1",
            params![enrollment_id],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to look up enrollment")?
        .ok_or_else(|| anyhow::anyhow!("Enrollment not found: {enrollment_id}"))
    }
}

fn enrollment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EnrollmentRecord> {
    let id: String = row.get(0)?;
    let raw_status: String = row.get(6)?;
    let host_date: Option<String> = row.get(8)?;
    let status = match raw_status.parse() {
        Ok(status) => status,
        Err(_) => {
            tracing::warn!(
                enrollment_id = %id,
                status = %raw_status,
                "Unknown enrollment status, treating as inactive"
            );
            EnrollmentStatus::Inactive
        }
    };
    Ok(EnrollmentRecord {
        id,
        session_id: row.get(1)?,
        student_id: row.get(2)?,
        student_name: row.get(3)?,
        address: row.get(4)?,
        phone: row.get(5)?,
        status,
        can_host: row.get(7)?,
        host_date: host_date.as_deref().and_then(parse_calendar_date),
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl HostRecordRepository for SqliteHostRepository {
    fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let conn = self.conn.lock().unwrap();
        let session = conn
            .query_row(
                "SELECT id, course_name, teacher_id, teacher_name, teacher_address,
                        teacher_phone, start_date, end_date, day_filter
                 FROM sessions WHERE id = ?1",
                params![session_id],
                |row| {
                    Ok(SessionRecord {
                        id: row.get(0)?,
                        course_name: row.get(1)?,
                        teacher_id: row.get(2)?,
                        teacher_name: row.get(3)?,
                        teacher_address: row.get(4)?,
                        teacher_phone: row.get(5)?,
                        start_date: row.get(6)?,
                        end_date: row.get(7)?,
                        day_filter: row.get(8)?,
                    })
                },
            )
            .optional()
            .context("Failed to get session")?;

        Ok(session)
    }

    fn upsert_session(&self, session: &SessionRecord) -> Result<()> {
        {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                r#"
                    INSERT INTO sessions (id, course_name, teacher_id, teacher_name,
                        teacher_address, teacher_phone, start_date, end_date, day_filter, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(id) DO UPDATE SET
                        course_name = excluded.course_name,
                        teacher_id = excluded.teacher_id,
                        teacher_name = excluded.teacher_name,
                        teacher_address = excluded.teacher_address,
                        teacher_phone = excluded.teacher_phone,
                        start_date = excluded.start_date,
                        end_date = excluded.end_date,
                        day_filter = excluded.day_filter,
                        updated_at = excluded.updated_at
                    "#,
                params![
                    session.id,
                    session.course_name,
                    session.teacher_id,
                    session.teacher_name,
                    session.teacher_address,
                    session.teacher_phone,
                    session.start_date,
                    session.end_date,
                    session.day_filter,
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("Failed to upsert session")?;
        }

        self.feed.publish(StoreEvent::SessionChanged {
            session_id: session.id.clone(),
        });
        Ok(())
    }

    fn list_active_enrollments(&self, session_id: &str) -> Result<Vec<EnrollmentRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, session_id, student_id, student_name, address, phone,
                        status, can_host, host_date
                 FROM enrollments
                 WHERE session_id = ?1
                 ORDER BY student_name COLLATE NOCASE, id",
            )
            .context("Failed to prepare enrollment query")?;

        // Status is filtered after parsing so bad values get logged
        let records = stmt
            .query_map(params![session_id], enrollment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list enrollments")?
            .into_iter()
            .filter(|e| e.status == EnrollmentStatus::Active)
            .collect();

        Ok(records)
    }

    fn upsert_enrollment(&self, record: &EnrollmentRecord) -> Result<UpsertOutcome> {
        let outcome = {
            let conn = self.conn.lock().unwrap();
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM enrollments WHERE id = ?1)",
                    params![record.id],
                    |row| row.get(0),
                )
                .context("Failed to check enrollment")?;

            let result = conn.execute(
                r#"
                    INSERT INTO enrollments (id, session_id, student_id, student_name,
                        address, phone, status, can_host, host_date)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(id) DO UPDATE SET
                        session_id = excluded.session_id,
                        student_id = excluded.student_id,
                        student_name = excluded.student_name,
                        address = excluded.address,
                        phone = excluded.phone,
                        status = excluded.status,
                        can_host = excluded.can_host,
                        host_date = excluded.host_date
                    "#,
                params![
                    record.id,
                    record.session_id,
                    record.student_id,
                    record.student_name,
                    record.address,
                    record.phone,
                    record.status.as_str(),
                    record.can_host,
                    record.host_date.map(format_date),
                ],
            );

            match result {
                Ok(_) if exists => UpsertOutcome::Updated,
                Ok(_) => UpsertOutcome::Inserted,
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!(
                        session_id = %record.session_id,
                        student_id = %record.student_id,
                        "Enrollment already exists, skipping"
                    );
                    return Ok(UpsertOutcome::Duplicate);
                }
                Err(e) => return Err(e).context("Failed to upsert enrollment"),
            }
        };

        self.feed.publish(StoreEvent::EnrollmentChanged {
            session_id: record.session_id.clone(),
            enrollment_id: record.id.clone(),
        });
        Ok(outcome)
    }

    fn set_enrollment_can_host(&self, enrollment_id: &str, can_host: bool) -> Result<()> {
        let session_id = {
            let conn = self.conn.lock().unwrap();
            let session_id = Self::enrollment_session(&conn, enrollment_id)?;
            conn.execute(
                "UPDATE enrollments SET can_host = ?1 WHERE id = ?2",
                params![can_host, enrollment_id],
            )
            .context("Failed to update can-host flag")?;
            session_id
        };

        self.feed.publish(StoreEvent::EnrollmentChanged {
            session_id,
            enrollment_id: enrollment_id.to_string(),
        });
        Ok(())
    }

    fn set_enrollment_host_date(
        &self,
        enrollment_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<()> {
        let session_id = {
            let conn = self.conn.lock().unwrap();
            let session_id = Self::enrollment_session(&conn, enrollment_id)?;
            conn.execute(
                "UPDATE enrollments SET host_date = ?1 WHERE id = ?2",
                params![date.map(format_date), enrollment_id],
            )
            .context("Failed to update host date")?;
            session_id
        };

        self.feed.publish(StoreEvent::EnrollmentChanged {
            session_id,
            enrollment_id: enrollment_id.to_string(),
        });
        Ok(())
    }

    fn get_teacher_host_date(
        &self,
        teacher_id: &str,
        session_id: &str,
    ) -> Result<Option<NaiveDate>> {
        let conn = self.conn.lock().unwrap();
        let value: Option<String> = conn
            .query_row(
                "SELECT host_date FROM teacher_hosts WHERE teacher_id = ?1 AND session_id = ?2",
                params![teacher_id, session_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to get teacher host date")?;

        Ok(value.as_deref().and_then(parse_calendar_date))
    }

    fn upsert_teacher_host_date(
        &self,
        teacher_id: &str,
        session_id: &str,
        date: NaiveDate,
    ) -> Result<()> {
        {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                r#"
                    INSERT INTO teacher_hosts (teacher_id, session_id, host_date, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(teacher_id, session_id) DO UPDATE SET
                        host_date = excluded.host_date,
                        updated_at = excluded.updated_at
                    "#,
                params![teacher_id, session_id, format_date(date), Utc::now().to_rfc3339()],
            )
            .context("Failed to upsert teacher host date")?;
        }

        self.feed.publish(StoreEvent::TeacherHostChanged {
            session_id: session_id.to_string(),
            teacher_id: teacher_id.to_string(),
        });
        Ok(())
    }

    fn delete_teacher_host_date(&self, teacher_id: &str, session_id: &str) -> Result<bool> {
        let deleted = {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "DELETE FROM teacher_hosts WHERE teacher_id = ?1 AND session_id = ?2",
                params![teacher_id, session_id],
            )
            .context("Failed to delete teacher host date")?
        };

        if deleted > 0 {
            self.feed.publish(StoreEvent::TeacherHostChanged {
                session_id: session_id.to_string(),
                teacher_id: teacher_id.to_string(),
            });
        }
        Ok(deleted > 0)
    }

    fn cancelled_dates(&self, session_id: &str) -> Result<BTreeSet<NaiveDate>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT date FROM attendance
                 WHERE session_id = ?1 AND host_address = ?2",
            )
            .context("Failed to prepare cancelled dates query")?;

        let dates = stmt
            .query_map(params![session_id, SESSION_CANCELLED_MARKER], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read cancelled dates")?
            .iter()
            .filter_map(|raw| parse_calendar_date(raw))
            .collect();

        Ok(dates)
    }

    fn mark_date_cancelled(
        &self,
        session_id: &str,
        date: NaiveDate,
        enrollment_ids: &[String],
    ) -> MarkOutcome {
        let mut outcome = MarkOutcome::default();
        {
            let conn = self.conn.lock().unwrap();
            for enrollment_id in enrollment_ids {
                let marker = AttendanceRecord::cancellation_marker(session_id, enrollment_id, date);
                let result = conn.execute(
                    r#"
                        INSERT INTO attendance (id, session_id, enrollment_id, date, status, host_address)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                        ON CONFLICT(enrollment_id, date) DO UPDATE SET
                            status = excluded.status,
                            host_address = excluded.host_address
                        "#,
                    params![
                        marker.id,
                        marker.session_id,
                        marker.enrollment_id,
                        format_date(date),
                        EXCUSED_STATUS,
                        SESSION_CANCELLED_MARKER,
                    ],
                )
                .with_context(|| format!("Failed to write cancellation for {enrollment_id}"));

                match result {
                    Ok(_) => outcome.written.push(enrollment_id.clone()),
                    Err(e) => outcome.failed.push((enrollment_id.clone(), e)),
                }
            }
        }

        if !outcome.written.is_empty() {
            self.feed.publish(StoreEvent::AttendanceChanged {
                session_id: session_id.to_string(),
                date,
            });
        }
        outcome
    }

    fn unmark_date_cancelled(
        &self,
        session_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let removed = {
            let conn = self.conn.lock().unwrap();
            let day = format_date(date);
            let mut stmt = conn
                .prepare(
                    "SELECT id, session_id, enrollment_id, status, host_address
                     FROM attendance
                     WHERE session_id = ?1 AND date = ?2 AND host_address = ?3",
                )
                .context("Failed to prepare cancellation query")?;

            let records = stmt
                .query_map(params![session_id, day, SESSION_CANCELLED_MARKER], |row| {
                    Ok(AttendanceRecord {
                        id: row.get(0)?,
                        session_id: row.get(1)?,
                        enrollment_id: row.get(2)?,
                        date,
                        status: row.get(3)?,
                        host_address: row.get(4)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("Failed to read cancellation markers")?;

            conn.execute(
                "DELETE FROM attendance WHERE session_id = ?1 AND date = ?2 AND host_address = ?3",
                params![session_id, day, SESSION_CANCELLED_MARKER],
            )
            .context("Failed to delete cancellation markers")?;

            records
        };

        if !removed.is_empty() {
            self.feed.publish(StoreEvent::AttendanceChanged {
                session_id: session_id.to_string(),
                date,
            });
        }
        Ok(removed)
    }

    fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
                INSERT INTO audit_log (id, action, table_name, record_id, details, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            params![
                entry.id,
                entry.action,
                entry.table_name,
                entry.record_id,
                entry.details,
                entry.created_at.to_rfc3339(),
            ],
        )
        .context("Failed to append audit entry")?;

        Ok(())
    }

    fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, action, table_name, record_id, details, created_at
                 FROM audit_log ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            )
            .context("Failed to prepare audit query")?;

        let entries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    action: row.get(1)?,
                    table_name: row.get(2)?,
                    record_id: row.get(3)?,
                    details: row.get(4)?,
                    created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(5)?)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list audit entries")?;

        Ok(entries)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.feed.subscribe()
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// In-memory mock implementation of HostRecordRepository
///
/// Useful for testing without database dependencies. Writes touching an id
/// registered with [`fail_writes_for`](Self::fail_writes_for) return an
/// error, which lets tests exercise partial failures of bulk operations.
pub struct MockHostRepository {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    enrollments: RwLock<HashMap<String, EnrollmentRecord>>,
    teacher_hosts: RwLock<HashMap<(String, String), NaiveDate>>,
    attendance: RwLock<Vec<AttendanceRecord>>,
    audit: RwLock<Vec<AuditEntry>>,
    failing_ids: RwLock<HashSet<String>>,
    feed: ChangeFeed,
}

impl MockHostRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            enrollments: RwLock::new(HashMap::new()),
            teacher_hosts: RwLock::new(HashMap::new()),
            attendance: RwLock::new(Vec::new()),
            audit: RwLock::new(Vec::new()),
            failing_ids: RwLock::new(HashSet::new()),
            feed: ChangeFeed::default(),
        }
    }

    /// Make every write for this enrollment or teacher id fail
    pub fn fail_writes_for(&self, id: &str) {
        self.failing_ids.write().unwrap().insert(id.to_string());
    }

    /// Stop injecting failures
    pub fn clear_failures(&self) {
        self.failing_ids.write().unwrap().clear();
    }

    /// Number of attendance rows (markers included)
    pub fn attendance_len(&self) -> usize {
        self.attendance.read().unwrap().len()
    }

    fn check_writable(&self, id: &str) -> Result<()> {
        if self.failing_ids.read().unwrap().contains(id) {
            anyhow::bail!("Injected write failure for {id}");
        }
        Ok(())
    }
}

impl Default for MockHostRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRecordRepository for MockHostRepository {
    fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().unwrap().get(session_id).cloned())
    }

    fn upsert_session(&self, session: &SessionRecord) -> Result<()> {
        self.sessions
            .write()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        self.feed.publish(StoreEvent::SessionChanged {
            session_id: session.id.clone(),
        });
        Ok(())
    }

    fn list_active_enrollments(&self, session_id: &str) -> Result<Vec<EnrollmentRecord>> {
        let enrollments = self.enrollments.read().unwrap();
        let mut records: Vec<EnrollmentRecord> = enrollments
            .values()
            .filter(|e| e.session_id == session_id && e.status == EnrollmentStatus::Active)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.student_name
                .to_lowercase()
                .cmp(&b.student_name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    fn upsert_enrollment(&self, record: &EnrollmentRecord) -> Result<UpsertOutcome> {
        let outcome = {
            let mut enrollments = self.enrollments.write().unwrap();
            let clash = enrollments.values().any(|e| {
                e.id != record.id
                    && e.session_id == record.session_id
                    && e.student_id == record.student_id
            });
            if clash {
                return Ok(UpsertOutcome::Duplicate);
            }

            match enrollments.insert(record.id.clone(), record.clone()) {
                Some(_) => UpsertOutcome::Updated,
                None => UpsertOutcome::Inserted,
            }
        };

        self.feed.publish(StoreEvent::EnrollmentChanged {
            session_id: record.session_id.clone(),
            enrollment_id: record.id.clone(),
        });
        Ok(outcome)
    }

    fn set_enrollment_can_host(&self, enrollment_id: &str, can_host: bool) -> Result<()> {
        self.check_writable(enrollment_id)?;
        let session_id = {
            let mut enrollments = self.enrollments.write().unwrap();
            let record = enrollments
                .get_mut(enrollment_id)
                .ok_or_else(|| anyhow::anyhow!("Enrollment not found: {enrollment_id}"))?;
            record.can_host = can_host;
            record.session_id.clone()
        };

        self.feed.publish(StoreEvent::EnrollmentChanged {
            session_id,
            enrollment_id: enrollment_id.to_string(),
        });
        Ok(())
    }

    fn set_enrollment_host_date(
        &self,
        enrollment_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<()> {
        self.check_writable(enrollment_id)?;
        let session_id = {
            let mut enrollments = self.enrollments.write().unwrap();
            let record = enrollments
                .get_mut(enrollment_id)
                .ok_or_else(|| anyhow::anyhow!("Enrollment not found: {enrollment_id}"))?;
            record.host_date = date;
            record.session_id.clone()
        };

        self.feed.publish(StoreEvent::EnrollmentChanged {
            session_id,
            enrollment_id: enrollment_id.to_string(),
        });
        Ok(())
    }

    fn get_teacher_host_date(
        &self,
        teacher_id: &str,
        session_id: &str,
    ) -> Result<Option<NaiveDate>> {
        let hosts = self.teacher_hosts.read().unwrap();
        Ok(hosts
            .get(&(teacher_id.to_string(), session_id.to_string()))
            .copied())
    }

    fn upsert_teacher_host_date(
        &self,
        teacher_id: &str,
        session_id: &str,
        date: NaiveDate,
    ) -> Result<()> {
        self.check_writable(teacher_id)?;
        self.teacher_hosts
            .write()
            .unwrap()
            .insert((teacher_id.to_string(), session_id.to_string()), date);
        self.feed.publish(StoreEvent::TeacherHostChanged {
            session_id: session_id.to_string(),
            teacher_id: teacher_id.to_string(),
        });
        Ok(())
    }

    fn delete_teacher_host_date(&self, teacher_id: &str, session_id: &str) -> Result<bool> {
        self.check_writable(teacher_id)?;
        let existed = self
            .teacher_hosts
            .write()
            .unwrap()
            .remove(&(teacher_id.to_string(), session_id.to_string()))
            .is_some();
        if existed {
            self.feed.publish(StoreEvent::TeacherHostChanged {
                session_id: session_id.to_string(),
                teacher_id: teacher_id.to_string(),
            });
        }
        Ok(existed)
    }

    fn cancelled_dates(&self, session_id: &str) -> Result<BTreeSet<NaiveDate>> {
        let attendance = self.attendance.read().unwrap();
        Ok(attendance
            .iter()
            .filter(|a| a.session_id == session_id && a.is_cancellation_marker())
            .map(|a| a.date)
            .collect())
    }

    fn mark_date_cancelled(
        &self,
        session_id: &str,
        date: NaiveDate,
        enrollment_ids: &[String],
    ) -> MarkOutcome {
        let mut outcome = MarkOutcome::default();
        {
            let mut attendance = self.attendance.write().unwrap();
            for enrollment_id in enrollment_ids {
                if let Err(e) = self.check_writable(enrollment_id) {
                    outcome.failed.push((enrollment_id.clone(), e));
                    continue;
                }
                let marker = AttendanceRecord::cancellation_marker(session_id, enrollment_id, date);
                match attendance
                    .iter_mut()
                    .find(|a| a.enrollment_id == *enrollment_id && a.date == date)
                {
                    Some(existing) => {
                        existing.status = marker.status;
                        existing.host_address = marker.host_address;
                    }
                    None => attendance.push(marker),
                }
                outcome.written.push(enrollment_id.clone());
            }
        }

        if !outcome.written.is_empty() {
            self.feed.publish(StoreEvent::AttendanceChanged {
                session_id: session_id.to_string(),
                date,
            });
        }
        outcome
    }

    fn unmark_date_cancelled(
        &self,
        session_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let removed: Vec<AttendanceRecord> = {
            let mut attendance = self.attendance.write().unwrap();
            let (removed, kept) = attendance.drain(..).partition(|a: &AttendanceRecord| {
                a.session_id == session_id && a.date == date && a.is_cancellation_marker()
            });
            *attendance = kept;
            removed
        };

        if !removed.is_empty() {
            self.feed.publish(StoreEvent::AttendanceChanged {
                session_id: session_id.to_string(),
                date,
            });
        }
        Ok(removed)
    }

    fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        self.audit.write().unwrap().push(entry.clone());
        Ok(())
    }

    fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let audit = self.audit.read().unwrap();
        Ok(audit.iter().rev().take(limit).cloned().collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.feed.subscribe()
    }
}

// ============================================================================
// Shared Repository Types
// ============================================================================

/// Thread-safe shared repository wrapper
pub type SharedHostRepository = Arc<dyn HostRecordRepository>;

/// Create a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> Result<SharedHostRepository> {
    let repo = SqliteHostRepository::new(path)?;
    Ok(Arc::new(repo))
}

/// Create a shared mock repository
pub fn create_mock_repository() -> SharedHostRepository {
    Arc::new(MockHostRepository::new())
}

// ============================================================================
// Tests
// ============================================================================
