//! Report file output for hostcheck CLI.
//!
//! Renders a finished `CheckReport` to CSV (one file for entries, one for
//! category summaries) or to a single JSON document. Output paths come from a
//! template in which `{timestamp}` is replaced by the run's local time.

use chrono::{DateTime, Local};
use csv::{Terminator, Writer, WriterBuilder};
use hostcheck_lib::{CheckReport, HostCheckError, ProbeStatus};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default output template, relative to the working directory.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "hostcheck_{timestamp}";

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{}', use csv or json", other)),
        }
    }
}

/// Timestamp used in file names, e.g. `20260119_134502`.
pub fn file_timestamp(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Expand `{timestamp}` in a template.
pub fn expand_template(template: &str, now: &DateTime<Local>) -> String {
    template.replace("{timestamp}", &file_timestamp(now))
}

/// Path of the main report file for a template and format.
pub fn report_path(template: &str, format: ReportFormat, now: &DateTime<Local>) -> PathBuf {
    let mut path = PathBuf::from(expand_template(template, now));
    if path.extension().and_then(|e| e.to_str()) != Some(format.extension()) {
        let mut name = path.into_os_string();
        name.push(".");
        name.push(format.extension());
        path = PathBuf::from(name);
    }
    path
}

/// Sibling path for the category summary CSV (`report.csv` -> `report_categories.csv`).
fn categories_path(report_file: &Path) -> PathBuf {
    let stem = report_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    report_file.with_file_name(format!("{}_categories.csv", stem))
}

/// Write the report and return every file created.
pub fn write_report(
    report: &CheckReport,
    path: &Path,
    format: ReportFormat,
    generated_at: &DateTime<Local>,
) -> Result<Vec<PathBuf>, HostCheckError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
    }

    match format {
        ReportFormat::Csv => {
            let summary_path = categories_path(path);
            fs::write(path, render_entries_csv(report)?).map_err(|e| write_error(path, e))?;
            fs::write(&summary_path, render_categories_csv(report)?)
                .map_err(|e| write_error(&summary_path, e))?;
            Ok(vec![path.to_path_buf(), summary_path])
        }
        ReportFormat::Json => {
            let json = render_json(report, generated_at)?;
            fs::write(path, json).map_err(|e| write_error(path, e))?;
            Ok(vec![path.to_path_buf()])
        }
    }
}

fn write_error(path: &Path, e: std::io::Error) -> HostCheckError {
    HostCheckError::file_error(path.to_string_lossy(), format!("Failed to write report: {}", e))
}

/// One row per entry, sequence order.
pub fn render_entries_csv(report: &CheckReport) -> Result<String, HostCheckError> {
    let mut writer = csv_writer();

    writer
        .write_record([
            "#",
            "category",
            "identifier",
            "alias",
            "identifier_ping",
            "alias_ping",
            "status",
        ])
        .map_err(csv_error)?;

    for outcome in &report.outcomes {
        let sequence = outcome.sequence.to_string();
        let status = outcome.status().to_string();
        writer
            .write_record([
                sequence.as_str(),
                outcome.category.as_str(),
                outcome.identifier.as_str(),
                outcome.alias.as_str(),
                ProbeStatus::from(outcome.identifier_reachable).short_label(),
                ProbeStatus::from(outcome.alias_reachable).short_label(),
                status.as_str(),
            ])
            .map_err(csv_error)?;
    }

    finish_csv(writer)
}

/// One row per category, followed by the overall totals.
pub fn render_categories_csv(report: &CheckReport) -> Result<String, HostCheckError> {
    let mut writer = csv_writer();

    writer
        .write_record(["category", "total", "online", "offline", "percent_online"])
        .map_err(csv_error)?;

    for summary in &report.aggregate.categories {
        writer
            .write_record([
                summary.category.clone(),
                summary.total.to_string(),
                summary.reachable.to_string(),
                summary.unreachable.to_string(),
                format!("{:.1}", summary.percent_reachable),
            ])
            .map_err(csv_error)?;
    }

    let totals = &report.aggregate;
    writer
        .write_record([
            "TOTAL".to_string(),
            totals.total.to_string(),
            totals.reachable.to_string(),
            totals.unreachable.to_string(),
            format!("{:.1}", totals.percent_reachable()),
        ])
        .map_err(csv_error)?;

    finish_csv(writer)
}

fn csv_writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish_csv(writer: Writer<Vec<u8>>) -> Result<String, HostCheckError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| HostCheckError::internal(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| HostCheckError::internal(format!("CSV output is not UTF-8: {}", e)))
}

fn csv_error(e: csv::Error) -> HostCheckError {
    HostCheckError::internal(format!("Failed to write CSV record: {}", e))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    version: &'static str,
    #[serde(flatten)]
    report: &'a CheckReport,
}

/// Whole report as pretty JSON with a generation timestamp.
pub fn render_json(
    report: &CheckReport,
    generated_at: &DateTime<Local>,
) -> Result<String, HostCheckError> {
    let document = JsonReport {
        generated_at: generated_at.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        report,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}
