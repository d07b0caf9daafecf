//! Schedule exports
//!
//! A [`ScheduleExport`] is built once from the displayed candidates and
//! rendered to CSV, JSON, Markdown (Handlebars) or Excel. Every label comes
//! from the locale the export was built with.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use umya_spreadsheet::{new_file, writer};

use crate::i18n::{normalize_locale, t};
use crate::models::{HostCandidate, SessionRecord};
use crate::scheduler::calendar::format_date;
use crate::utils::csv_line;

/// Markdown template
const SCHEDULE_TEMPLATE: &str = include_str!("../../templates/schedule.hbs");

// ============================================================================
// Formats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Markdown,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Xlsx => "xlsx",
        }
    }

    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Markdown),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(format!(
                "Unknown export format '{other}'. Valid: csv, json, markdown, xlsx"
            )),
        }
    }
}

// ============================================================================
// Export data
// ============================================================================

/// Localized column labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportHeaders {
    pub index: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub host_date: String,
    pub weekday: String,
    pub role: String,
    pub cancelled: String,
}

impl ExportHeaders {
    pub fn for_locale(locale: &str) -> Self {
        let locale = normalize_locale(locale);
        let locale = locale.as_str();
        Self {
            index: t!("export.header.index", locale = locale).into(),
            name: t!("export.header.name", locale = locale).into(),
            address: t!("export.header.address", locale = locale).into(),
            phone: t!("export.header.phone", locale = locale).into(),
            host_date: t!("export.header.host_date", locale = locale).into(),
            weekday: t!("export.header.weekday", locale = locale).into(),
            role: t!("export.header.role", locale = locale).into(),
            cancelled: t!("export.header.cancelled", locale = locale).into(),
        }
    }

    fn as_row(&self) -> [&str; 8] {
        [
            &self.index,
            &self.name,
            &self.address,
            &self.phone,
            &self.host_date,
            &self.weekday,
            &self.role,
            &self.cancelled,
        ]
    }
}

/// One candidate row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    /// 1-based position in display order
    pub index: usize,
    pub name: String,
    pub address: String,
    pub phone: String,
    /// `YYYY-MM-DD` or empty
    pub host_date: String,
    pub weekday: String,
    pub role: String,
    pub cancelled: bool,
    /// Localized yes/no for `cancelled`
    pub cancelled_label: String,
}

impl ExportRow {
    fn cells(&self) -> [String; 8] {
        [
            self.index.to_string(),
            self.name.clone(),
            self.address.clone(),
            self.phone.clone(),
            self.host_date.clone(),
            self.weekday.clone(),
            self.role.clone(),
            self.cancelled_label.clone(),
        ]
    }
}

fn weekday_label(day: Weekday, locale: &str) -> String {
    let key = match day {
        Weekday::Sun => "weekday.sun",
        Weekday::Mon => "weekday.mon",
        Weekday::Tue => "weekday.tue",
        Weekday::Wed => "weekday.wed",
        Weekday::Thu => "weekday.thu",
        Weekday::Fri => "weekday.fri",
        Weekday::Sat => "weekday.sat",
    };
    t!(key, locale = locale).into()
}

/// A schedule ready to be written in any [`ExportFormat`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleExport {
    pub title: String,
    pub session_id: String,
    pub course_name: String,
    pub locale: String,
    pub generated_at: String,
    pub course_label: String,
    pub generated_label: String,
    pub headers: ExportHeaders,
    pub rows: Vec<ExportRow>,
}

impl ScheduleExport {
    /// Build rows from candidates already in display order
    pub fn build(
        session: &SessionRecord,
        displayed: &[HostCandidate],
        cancelled: &BTreeSet<NaiveDate>,
        locale: &str,
    ) -> Self {
        // ko-KR and friends share the "ko" labels
        let locale = normalize_locale(locale);
        let locale = locale.as_str();
        let flag = |set: bool| -> String {
            if set {
                t!("export.flag_set", locale = locale).into()
            } else {
                t!("export.flag_unset", locale = locale).into()
            }
        };

        let rows = displayed
            .iter()
            .enumerate()
            .map(|(idx, candidate)| {
                let is_cancelled = candidate
                    .assigned_date
                    .map(|d| cancelled.contains(&d))
                    .unwrap_or(false);
                let role = if candidate.is_teacher {
                    t!("export.role.teacher", locale = locale)
                } else {
                    t!("export.role.student", locale = locale)
                };

                ExportRow {
                    index: idx + 1,
                    name: candidate.display_name.clone(),
                    address: candidate.address.clone().unwrap_or_default(),
                    phone: candidate.phone.clone().unwrap_or_default(),
                    host_date: candidate.assigned_date.map(format_date).unwrap_or_default(),
                    weekday: candidate
                        .assigned_date
                        .map(|d| weekday_label(d.weekday(), locale))
                        .unwrap_or_default(),
                    role: role.into(),
                    cancelled: is_cancelled,
                    cancelled_label: flag(is_cancelled),
                }
            })
            .collect();

        Self {
            title: t!("export.title", locale = locale).into(),
            session_id: session.id.clone(),
            course_name: session.course_name.clone(),
            locale: locale.to_string(),
            generated_at: Utc::now().format("%Y-%m-%d %H:%M").to_string(),
            course_label: t!("export.course", locale = locale).into(),
            generated_label: t!("export.generated", locale = locale).into(),
            headers: ExportHeaders::for_locale(locale),
            rows,
        }
    }

    // ------------------------------------------------------------------------
    // Renderers
    // ------------------------------------------------------------------------

    pub fn to_csv(&self) -> String {
        let mut out = csv_line(&self.headers.as_row());
        out.push('\n');
        for row in &self.rows {
            out.push_str(&csv_line(&row.cells()));
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize schedule")
    }

    pub fn to_markdown(&self) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string("schedule", SCHEDULE_TEMPLATE)
            .context("Failed to register schedule template")?;

        // Table cells cannot contain raw pipes or line breaks
        let mut table = self.clone();
        for row in &mut table.rows {
            for cell in [&mut row.name, &mut row.address, &mut row.phone] {
                *cell = cell.replace('|', "\\|").replace(|c: char| c == '\r' || c == '\n', " ");
            }
        }

        handlebars
            .render("schedule", &table)
            .context("Failed to render schedule template")
    }

    /// Write an Excel workbook with a title row and the table below it
    pub fn write_xlsx(&self, path: &Path) -> Result<()> {
        let mut book = new_file();
        let sheet = book
            .get_sheet_by_name_mut("Sheet1")
            .context("Workbook has no default sheet")?;

        sheet.get_cell_mut("A1").set_value(self.title.clone());
        sheet
            .get_cell_mut("A2")
            .set_value(format!("{}: {}", self.course_label, self.course_name));

        for (i, header) in self.headers.as_row().iter().enumerate() {
            let cell_address = format!("{}4", col_to_letter(i + 1));
            sheet.get_cell_mut(&*cell_address).set_value(*header);
        }

        for (i, row) in self.rows.iter().enumerate() {
            let row_no = i + 5;
            for (j, value) in row.cells().iter().enumerate() {
                let cell_address = format!("{}{}", col_to_letter(j + 1), row_no);
                sheet.get_cell_mut(&*cell_address).set_value(value.clone());
            }
        }

        writer::xlsx::write(&book, path)
            .map_err(|e| anyhow::anyhow!("Failed to write workbook {}: {e}", path.display()))
    }

    /// Write the export to `path`, creating parent directories
    pub fn write(&self, format: ExportFormat, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let text = match format {
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Json => self.to_json()?,
            ExportFormat::Markdown => self.to_markdown()?,
            ExportFormat::Xlsx => {
                self.write_xlsx(path)?;
                tracing::info!(path = %path.display(), rows = self.rows.len(), "Exported schedule");
                return Ok(());
            }
        };

        std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), format = %format, rows = self.rows.len(), "Exported schedule");
        Ok(())
    }

    /// Default file name, e.g. `hosts-<session>.csv`
    pub fn file_name(&self, format: ExportFormat) -> String {
        format!("hosts-{}.{}", self.session_id, format.extension())
    }
}

/// 1-based column index to a spreadsheet column letter (A..Z)
fn col_to_letter(col: usize) -> String {
    ((b'A' + (col as u8) - 1) as char).to_string()
}
