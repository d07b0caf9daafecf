use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use hostrota::i18n::t;
use hostrota::models::CandidateId;
use hostrota::scheduler::calendar::{format_date, parse_calendar_date};
use hostrota::scheduler::{
    AssignRequest, HostRotation, IssueLevel, PendingAction, SchedulerError, ShiftDirection,
};

use super::{confirm, print_report, App};

fn parse_date(input: &str) -> Result<NaiveDate> {
    parse_calendar_date(input).ok_or_else(|| SchedulerError::invalid_date(input).into())
}

/// Confirm and run a pending action, or report that nothing changed
fn run_confirmed(app: &App, rotation: &mut HostRotation, action: PendingAction, yes: bool) -> Result<()> {
    if !confirm(&action, yes)? {
        println!("{}", t!("cli.aborted"));
        return Ok(());
    }
    let report = rotation.confirm(action)?;
    print_report(app, &report);
    Ok(())
}

pub fn show(app: &App, session_id: &str, all: bool, grid: bool) -> Result<()> {
    let rotation = app.rotation(session_id, all)?;
    let session = rotation.session();
    println!("{} ({})", session.course_name, session.id);
    println!(
        "{} .. {}  {}",
        session.start_date,
        session.end_date,
        session.day_filter.as_deref().unwrap_or("every day")
    );
    println!();

    if grid {
        for day in rotation.grid().days {
            let hosts = day
                .hosts
                .iter()
                .map(|h| h.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let mut flags = String::new();
            if day.cancelled {
                flags.push_str(" [cancelled]");
            }
            if !day.in_window {
                flags.push_str(" [outside window]");
            }
            if day.has_conflict() {
                flags.push_str(" [duplicate]");
            }
            println!("{}  {}  {}{}", format_date(day.date), day.weekday, hosts, flags);
        }
        return Ok(());
    }

    for (idx, candidate) in rotation.displayed().iter().enumerate() {
        let date = candidate
            .assigned_date
            .map(|d| format!("{} {}", format_date(d), d.weekday()))
            .unwrap_or_else(|| "-".to_string());
        let role = if candidate.is_teacher { " (teacher)" } else { "" };
        println!(
            "{:>3}. {:<24} {:<16} {}{}",
            idx + 1,
            candidate.display_name,
            date,
            candidate.id,
            role
        );
    }
    Ok(())
}

pub fn validate(app: &App, session_id: &str, all: bool) -> Result<()> {
    let rotation = app.rotation(session_id, all)?;
    let report = rotation.validate();

    for issue in &report.issues {
        let marker = match issue.level {
            IssueLevel::Error => "✗",
            IssueLevel::Warning => "!",
            IssueLevel::Info => "·",
            IssueLevel::Success => "✓",
        };
        println!("{marker} [{}] {}", issue.level, issue.message);
    }

    let coverage = report.coverage;
    println!(
        "coverage: {}/{} ({:.0}%), {} remaining",
        coverage.covered,
        coverage.window_size,
        coverage.fraction() * 100.0,
        coverage.remaining
    );
    Ok(())
}

pub fn assign(
    app: &App,
    session_id: &str,
    candidate: &str,
    date: Option<&str>,
    yes: bool,
) -> Result<()> {
    let mut rotation = app.rotation(session_id, true)?;
    let date = date.map(parse_date).transpose()?;
    let id = CandidateId::from(candidate);

    match rotation.request_assign(&id, date)? {
        AssignRequest::Applied(report) => print_report(app, &report),
        AssignRequest::NeedsConfirmation(action) => run_confirmed(app, &mut rotation, action, yes)?,
    }
    Ok(())
}

pub fn shift(app: &App, session_id: &str, direction: ShiftDirection, all: bool) -> Result<()> {
    let mut rotation = app.rotation(session_id, all)?;
    let report = rotation.shift_all(direction);
    print_report(app, &report);
    Ok(())
}

pub fn clear(app: &App, session_id: &str, all: bool, yes: bool) -> Result<()> {
    let mut rotation = app.rotation(session_id, all)?;
    let action = rotation.request_clear_all();
    run_confirmed(app, &mut rotation, action, yes)
}

pub fn quick_fix(app: &App, session_id: &str, all: bool) -> Result<()> {
    let mut rotation = app.rotation(session_id, all)?;
    let report = rotation.quick_fix();
    print_report(app, &report);
    Ok(())
}

pub fn cancel(app: &App, session_id: &str, date: &str, yes: bool) -> Result<()> {
    let mut rotation = app.rotation(session_id, false)?;
    let action = rotation.request_mark_cancelled(parse_date(date)?);
    run_confirmed(app, &mut rotation, action, yes)
}

pub fn uncancel(app: &App, session_id: &str, date: &str, yes: bool) -> Result<()> {
    let mut rotation = app.rotation(session_id, false)?;
    let action = rotation.request_unmark_cancelled(parse_date(date)?);
    run_confirmed(app, &mut rotation, action, yes)
}

pub fn can_host(app: &App, session_id: &str, candidate: &str, value: bool) -> Result<()> {
    let mut rotation = app.rotation(session_id, true)?;
    let report = rotation.set_can_host(&CandidateId::from(candidate), value)?;
    print_report(app, &report);
    Ok(())
}
