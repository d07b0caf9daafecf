//! CSV bulk import of enrollments
//!
//! Rows are written one at a time. A row that collides with an existing
//! (session, student) enrollment is counted as a duplicate and skipped; a
//! malformed row is recorded as a failure. Neither stops the import.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::repository::{HostRecordRepository, UpsertOutcome};
use crate::models::{EnrollmentRecord, EnrollmentStatus};
use crate::scheduler::calendar::parse_calendar_date;
use crate::utils::{non_blank, parse_boolish, parse_csv_record};

const REQUIRED_COLUMNS: [&str; 5] = ["student_id", "student_name", "address", "phone", "can_host"];

/// Errors that abort an import before any row is written
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV content is empty")]
    Empty,

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Session not found: {0}")]
    UnknownSession(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// A row that could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    /// 1-based line number in the input
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
    pub duplicates: usize,
    pub failures: Vec<ImportFailure>,
}

impl ImportSummary {
    pub fn processed(&self) -> usize {
        self.inserted + self.updated + self.duplicates + self.failures.len()
    }
}

struct Columns {
    student_id: usize,
    student_name: usize,
    address: usize,
    phone: usize,
    can_host: usize,
    status: Option<usize>,
    host_date: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, ImportError> {
        let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| names.iter().position(|h| h == name);

        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| find(c).is_none()) {
            return Err(ImportError::MissingColumn(missing.to_string()));
        }

        Ok(Self {
            student_id: find("student_id").unwrap_or_default(),
            student_name: find("student_name").unwrap_or_default(),
            address: find("address").unwrap_or_default(),
            phone: find("phone").unwrap_or_default(),
            can_host: find("can_host").unwrap_or_default(),
            status: find("status"),
            host_date: find("host_date"),
        })
    }
}

fn field(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn parse_row(
    session_id: &str,
    columns: &Columns,
    row: &[String],
) -> Result<EnrollmentRecord, String> {
    let student_id = non_blank(field(row, columns.student_id)).ok_or("missing student_id")?;
    let student_name = non_blank(field(row, columns.student_name)).ok_or("missing student_name")?;

    let raw_can_host = field(row, columns.can_host);
    let can_host = if raw_can_host.trim().is_empty() {
        false
    } else {
        parse_boolish(raw_can_host).ok_or_else(|| format!("invalid can_host '{raw_can_host}'"))?
    };

    let status = match columns.status.map(|idx| field(row, idx).trim()) {
        Some(raw) if !raw.is_empty() => raw.parse::<EnrollmentStatus>()?,
        _ => EnrollmentStatus::default(),
    };

    let host_date = match columns.host_date.map(|idx| field(row, idx).trim()) {
        Some(raw) if !raw.is_empty() => {
            Some(parse_calendar_date(raw).ok_or_else(|| format!("invalid host_date '{raw}'"))?)
        }
        _ => None,
    };

    Ok(EnrollmentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        student_id,
        student_name,
        address: non_blank(field(row, columns.address)),
        phone: non_blank(field(row, columns.phone)),
        status,
        can_host,
        host_date,
    })
}

/// Import enrollments for a session from CSV text
///
/// The header row is required; columns are matched by name,
/// case-insensitively. Blank lines are skipped.
pub fn import_enrollments_csv(
    repo: &dyn HostRecordRepository,
    session_id: &str,
    content: &str,
) -> Result<ImportSummary, ImportError> {
    if repo.get_session(session_id)?.is_none() {
        return Err(ImportError::UnknownSession(session_id.to_string()));
    }

    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_start_matches('\u{feff}')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or(ImportError::Empty)?;
    let columns = Columns::from_header(&parse_csv_record(header))?;

    let mut summary = ImportSummary::default();
    for (line_no, line) in lines {
        let row = parse_csv_record(line);
        let record = match parse_row(session_id, &columns, &row) {
            Ok(record) => record,
            Err(reason) => {
                tracing::warn!(line = line_no, %reason, "Skipping CSV row");
                summary.failures.push(ImportFailure { line: line_no, reason });
                continue;
            }
        };

        match repo.upsert_enrollment(&record) {
            Ok(UpsertOutcome::Inserted) => summary.inserted += 1,
            Ok(UpsertOutcome::Updated) => summary.updated += 1,
            Ok(UpsertOutcome::Duplicate) => summary.duplicates += 1,
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::warn!(line = line_no, %reason, "Failed to store CSV row");
                summary.failures.push(ImportFailure { line: line_no, reason });
            }
        }
    }

    tracing::info!(
        session_id,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        failed = summary.failures.len(),
        "CSV import finished"
    );
    Ok(summary)
}
