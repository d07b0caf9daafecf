use anyhow::{Context, Result};
use chrono::Datelike;
use std::path::Path;

use hostrota::i18n::t;
use hostrota::models::SessionRecord;
use hostrota::scheduler::calendar::{format_date, parse_calendar_date, parse_day_filter};
use hostrota::scheduler::{expand_window, SchedulerError};
use hostrota::storage::import_enrollments_csv;

use super::App;

pub fn dates(start: &str, end: &str, days: Option<&str>) -> Result<()> {
    if let Some(filter) = days.map(parse_day_filter) {
        for token in &filter.ignored {
            println!("! ignored weekday '{token}'");
        }
    }

    let dates = expand_window(start, end, days);
    if dates.is_empty() {
        println!("No meeting dates in {start} .. {end}");
        return Ok(());
    }

    for date in &dates {
        println!("{}  {}", format_date(*date), date.weekday());
    }
    println!("{} meeting date(s)", dates.len());
    Ok(())
}

pub struct SessionParams {
    pub id: String,
    pub course: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub teacher_address: Option<String>,
    pub teacher_phone: Option<String>,
    pub start: String,
    pub end: String,
    pub days: Option<String>,
}

pub fn session_add(app: &App, params: SessionParams) -> Result<()> {
    // Stored dates stay lenient, but a new session should start out valid
    for input in [&params.start, &params.end] {
        if parse_calendar_date(input).is_none() {
            return Err(SchedulerError::invalid_date(input.as_str()).into());
        }
    }

    let session = SessionRecord {
        id: params.id,
        course_name: params.course,
        teacher_id: params.teacher_id,
        teacher_name: params.teacher_name,
        teacher_address: params.teacher_address,
        teacher_phone: params.teacher_phone,
        start_date: params.start,
        end_date: params.end,
        day_filter: params.days,
    };
    app.store.upsert_session(&session)?;

    let meetings = expand_window(
        &session.start_date,
        &session.end_date,
        session.day_filter.as_deref(),
    );
    tracing::info!(session_id = %session.id, meetings = meetings.len(), "Saved session");
    println!(
        "Saved session {} ({}), {} meeting date(s)",
        session.id,
        session.course_name,
        meetings.len()
    );
    Ok(())
}

pub fn import(app: &App, session_id: &str, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let summary = import_enrollments_csv(app.store.as_ref(), session_id, &content)?;

    println!(
        "{}",
        t!(
            "cli.imported",
            inserted = summary.inserted,
            updated = summary.updated,
            duplicates = summary.duplicates,
            failed = summary.failures.len()
        )
    );
    for failure in &summary.failures {
        println!("  line {}: {}", failure.line, failure.reason);
    }
    Ok(())
}
