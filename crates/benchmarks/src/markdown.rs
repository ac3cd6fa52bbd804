//! Markdown output generation for run summaries.
//!
//! This module renders the per-run table together with the across-run means
//! and the candidate/baseline energy ratio.

use crate::result::{RunSummary, TargetSummary};
use std::fmt::{self, Write};

/// Generate a markdown summary from run summaries.
pub fn generate_summary(
    summaries: &[RunSummary],
    baseline_label: &str,
    candidate_label: &str,
) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut output, summaries, baseline_label, candidate_label);
    output
}

fn write_summary(
    output: &mut String,
    summaries: &[RunSummary],
    baseline_label: &str,
    candidate_label: &str,
) -> fmt::Result {
    writeln!(output, "# Benchmark Summary")?;
    writeln!(output)?;
    writeln!(output, "Generated: {}", chrono::Utc::now().to_rfc3339())?;
    writeln!(output)?;
    writeln!(output, "## Runs")?;
    writeln!(output)?;

    let columns = RunSummary::columns(baseline_label, candidate_label);
    writeln!(output, "| run | {} | energy ratio |", columns.join(" | "))?;
    writeln!(output, "|-----|{}", "---|".repeat(columns.len() + 1))?;

    for summary in summaries {
        let cells: Vec<String> = summary.row().iter().map(|v| format!("{v:.2}")).collect();
        writeln!(
            output,
            "| {} | {} | {} |",
            summary.run,
            cells.join(" | "),
            ratio_cell(summary.energy_ratio())
        )?;
    }

    let baseline_mean = TargetSummary::mean(summaries.iter().map(|s| &s.baseline));
    let candidate_mean = TargetSummary::mean(summaries.iter().map(|s| &s.candidate));
    if let (Some(baseline), Some(candidate)) = (baseline_mean, candidate_mean) {
        let cells: Vec<String> = baseline
            .values()
            .iter()
            .chain(candidate.values().iter())
            .map(|v| format!("{v:.2}"))
            .collect();
        let ratio = candidate.energy_ratio(&baseline);
        writeln!(output, "| mean | {} | {} |", cells.join(" | "), ratio_cell(ratio))?;

        writeln!(output)?;
        writeln!(output, "## Energy")?;
        writeln!(output)?;
        writeln!(
            output,
            "Mean CPU energy: {baseline_label} {:.2}, {candidate_label} {:.2}",
            baseline.cpu_energy, candidate.cpu_energy
        )?;
        if let Some(ratio) = ratio {
            writeln!(output, "Ratio {candidate_label}/{baseline_label}: {ratio:.3}")?;
        }
    }

    writeln!(output)?;
    writeln!(output, "---")?;
    writeln!(output, "Total runs: {}", summaries.len())?;

    Ok(())
}

fn ratio_cell(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "-".to_string(), |ratio| format!("{ratio:.3}"))
}
