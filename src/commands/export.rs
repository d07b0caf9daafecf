use anyhow::Result;
use std::path::PathBuf;

use hostrota::export::{ExportFormat, ScheduleExport};
use hostrota::i18n::t;

use super::App;

pub fn export(
    app: &App,
    session_id: &str,
    format: Option<&str>,
    output: Option<PathBuf>,
    all: bool,
) -> Result<()> {
    let rotation = app.rotation(session_id, all)?;

    // Explicit flag, then the output extension, then config
    let format = match format {
        Some(raw) => raw.parse::<ExportFormat>().map_err(anyhow::Error::msg)?,
        None => output
            .as_deref()
            .and_then(ExportFormat::from_path)
            .unwrap_or(app.config.export.default_format),
    };

    let schedule = ScheduleExport::build(
        rotation.session(),
        &rotation.displayed(),
        rotation.cancelled_dates(),
        &app.locale(),
    );
    let path = output.unwrap_or_else(|| {
        app.config
            .export
            .output_dir
            .join(schedule.file_name(format))
    });

    schedule.write(format, &path)?;
    println!("{}", t!("cli.exported", path = path.display().to_string()));
    Ok(())
}

pub fn audit(app: &App, limit: usize) -> Result<()> {
    let entries = app.store.list_audit(limit)?;
    if entries.is_empty() {
        println!("No audit entries");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  {:<8} {:<12} {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.action,
            entry.table_name,
            entry.record_id
        );
        if let Some(details) = entry.details {
            println!("    {details}");
        }
    }
    Ok(())
}
