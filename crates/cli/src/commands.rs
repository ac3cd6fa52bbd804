//! Subcommand implementations.
//!
//! Every command returns `Ok(true)` on success and `Ok(false)` when it ran to
//! completion but found a failure (divergent cases, differing files).

use crate::settings::{Settings, DEFAULT_CONFIG_FILE};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use graphcl_parity_adapters::{
    load_queries, sample_queries, write_sample_queries, HttpGraphqlClient, ParityConfig,
    ParityHarness, ParityReport, QueryCase,
};
use graphcl_parity_benchmarks::{io, summarize_runs, SummaryConfig};
use graphcl_parity_core::compare::SemanticComparator;
use graphcl_parity_core::normalize::IgnoreKeySet;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::warn;

fn harness(config: &ParityConfig) -> Result<ParityHarness<HttpGraphqlClient, HttpGraphqlClient>> {
    config.validate()?;
    let left = HttpGraphqlClient::new(config.left.clone())?;
    let right = HttpGraphqlClient::new(config.right.clone())?;
    Ok(ParityHarness::new(left, right, config.comparator()))
}

/// Load the query cases at `path`, writing the sample cases there first if
/// the file does not exist yet.
pub fn load_or_create_queries(path: &Path) -> Result<Vec<QueryCase>> {
    if !path.exists() {
        warn!(path = %path.display(), "Query file not found, writing sample queries");
        write_sample_queries(path).with_context(|| {
            format!(
                "Failed to create {}; write one with `graphcl-parity init-queries`",
                path.display()
            )
        })?;
        println!(
            "{} {} not found, wrote {} sample query case(s)",
            "!".yellow(),
            path.display(),
            sample_queries().len()
        );
    }
    load_queries(path).with_context(|| {
        format!(
            "Failed to load query cases; `graphcl-parity init-queries {}` writes a valid file",
            path.display()
        )
    })
}

/// Run every query case against both deployments.
pub async fn parity(config: &ParityConfig) -> Result<bool> {
    let cases = load_or_create_queries(&config.queries_file)?;
    if cases.is_empty() {
        bail!("No query cases in {}", config.queries_file.display());
    }

    println!(
        "Comparing {} with {} ({} case(s))",
        config.left.url.cyan(),
        config.right.url.cyan(),
        cases.len()
    );

    let harness = harness(config)?;
    let report = harness.run_all(&cases).await;
    print_report(&report);

    if let Some(dir) = &config.sample_dir {
        let written = report
            .write_samples(dir)
            .with_context(|| format!("Failed to write sample outputs to {}", dir.display()))?;
        println!("Wrote {written} sample output(s) to {}", dir.display());
    }

    Ok(report.is_success())
}

fn print_report(report: &ParityReport) {
    for outcome in report.outcomes.iter().filter(|o| o.is_pass()) {
        println!("  {} {}", "✓".green(), outcome.id);
    }
    for outcome in report.failures() {
        println!("  {} {}", "✗".red(), outcome);
    }

    let totals = report.to_string();
    if report.is_success() {
        println!("\n{}", totals.green().bold());
    } else {
        println!("\n{}", totals.red().bold());
    }
}

/// Check that both deployments share at least one schema type.
pub async fn schema(config: &ParityConfig, verbose: bool) -> Result<bool> {
    let harness = harness(config)?;
    let compatibility = harness.check_schema_compatibility().await?;

    println!(
        "{}: {} type(s), {}: {} type(s)",
        config.left.name,
        compatibility.left_types.len(),
        config.right.name,
        compatibility.right_types.len()
    );
    println!(
        "{} {} common type(s)",
        "✓".green(),
        compatibility.common_types.len()
    );
    if verbose {
        for name in &compatibility.common_types {
            println!("  {name}");
        }
    }
    Ok(true)
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Compare two JSON documents offline.
pub fn diff(left: &Path, right: &Path, ignore_keys: IgnoreKeySet, json: bool) -> Result<bool> {
    let left_value = read_json(left)?;
    let right_value = read_json(right)?;
    let result = SemanticComparator::new(ignore_keys).compare(&left_value, &right_value);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.equal {
        println!("{}", "Documents are semantically equal".green());
    } else {
        println!(
            "{}",
            format!("{} semantic difference(s)", result.diff.len()).red().bold()
        );
        println!("{}", result.diff);
    }
    Ok(result.equal)
}

/// Output locations of the summarize command.
#[derive(Debug, Clone, Copy)]
pub struct SummaryOutputs<'a> {
    /// CSV table.
    pub csv: &'a Path,
    /// Optional markdown report.
    pub markdown: Option<&'a Path>,
    /// Optional JSON dump.
    pub json: Option<&'a Path>,
}

/// Summarize the numbered run directories under `base`.
pub fn summarize(config: &SummaryConfig, base: &Path, outputs: SummaryOutputs<'_>) -> Result<bool> {
    let summaries = summarize_runs(base, config)?;
    if summaries.is_empty() {
        bail!("No run directories found under {}", base.display());
    }

    let baseline = config.baseline.label.as_str();
    let candidate = config.candidate.label.as_str();

    io::write_summary_csv(&summaries, baseline, candidate, outputs.csv)?;
    println!(
        "{} Summarized {} run(s) into {}",
        "✓".green(),
        summaries.len(),
        outputs.csv.display()
    );

    if let Some(path) = outputs.markdown {
        io::write_summary_markdown(&summaries, baseline, candidate, path)?;
        println!("  markdown: {}", path.display());
    }
    if let Some(path) = outputs.json {
        io::write_results_json(&summaries, path)?;
        println!("  json: {}", path.display());
    }
    Ok(true)
}

/// Write the built-in sample query cases.
pub fn init_queries(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_sample_queries(path)?;
    println!(
        "{} Wrote {} sample query case(s) to {}",
        "✓".green(),
        sample_queries().len(),
        path.display()
    );
    Ok(true)
}

/// Print the effective configuration.
pub fn status(settings: &Settings, config_file: Option<&Path>) -> Result<bool> {
    let parity = &settings.parity;
    let summary = &settings.summary;

    println!("{}", "GraphCL Parity".bold());
    println!("Version: {}", env!("CARGO_PKG_VERSION"));

    let file = config_file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let found = if file.exists() { "found".green() } else { "not found".yellow() };
    println!("Config file: {} ({found})", file.display());

    println!("\n{}", "Parity".bold());
    println!("  {}: {}", parity.left.name, parity.left.url);
    println!("  {}: {}", parity.right.name, parity.right.url);
    let queries = if parity.queries_file.exists() { "found".green() } else { "not found".yellow() };
    println!("  queries: {} ({queries})", parity.queries_file.display());
    let keys: Vec<&str> = parity.ignore_keys.iter().collect();
    println!("  ignored keys: {}", keys.join(", "));
    if let Some(dir) = &parity.sample_dir {
        println!("  sample outputs: {}", dir.display());
    }

    println!("\n{}", "Summary".bold());
    println!(
        "  baseline: {} ({}, {})",
        summary.baseline.label,
        summary.baseline.telemetry_file.display(),
        summary.baseline.load_test_file.display()
    );
    println!(
        "  candidate: {} ({}, {})",
        summary.candidate.label,
        summary.candidate.telemetry_file.display(),
        summary.candidate.load_test_file.display()
    );
    println!("  max runs: {}", summary.max_runs);
    println!("  IQR multiplier: {}", summary.aggregator.multiplier);
    Ok(true)
}
