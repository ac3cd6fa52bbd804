//! I/O operations for run artifacts and summary reports.
//!
//! This module reads telemetry and load-test files from run directories and
//! writes the aggregated summaries as CSV, markdown and JSON.

use crate::error::{BenchmarkError, Result};
use crate::markdown;
use crate::result::RunSummary;
use crate::table;
use crate::telemetry::{parse_telemetry, TelemetryFields, TelemetryRecord};
use std::fs;
use std::path::Path;

/// Default CSV summary file name.
pub const SUMMARY_CSV: &str = "summary.csv";

/// Read a whole text file.
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| BenchmarkError::io(path, e))
}

/// Read a line-delimited telemetry file.
pub fn read_telemetry(
    path: impl AsRef<Path>,
    fields: &TelemetryFields,
) -> Result<Vec<TelemetryRecord>> {
    let path = path.as_ref();
    let text = read_text(path)?;
    parse_telemetry(&text, fields, path)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| BenchmarkError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| BenchmarkError::io(path, e))
}

/// Write the CSV summary table.
pub fn write_summary_csv(
    summaries: &[RunSummary],
    baseline_label: &str,
    candidate_label: &str,
    path: impl AsRef<Path>,
) -> Result<()> {
    let csv = table::render_csv(summaries, baseline_label, candidate_label);
    write_text(path.as_ref(), &csv)
}

/// Write the markdown summary.
pub fn write_summary_markdown(
    summaries: &[RunSummary],
    baseline_label: &str,
    candidate_label: &str,
    path: impl AsRef<Path>,
) -> Result<()> {
    let summary = markdown::generate_summary(summaries, baseline_label, candidate_label);
    write_text(path.as_ref(), &summary)
}

/// Write summaries to a JSON file.
pub fn write_results_json(summaries: &[RunSummary], path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(summaries)?;
    write_text(path.as_ref(), &json)
}

/// Read summaries from a JSON file.
pub fn read_results_json(path: impl AsRef<Path>) -> Result<Vec<RunSummary>> {
    let content = read_text(path)?;
    Ok(serde_json::from_str(&content)?)
}
