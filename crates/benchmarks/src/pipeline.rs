//! Batch processing of benchmark run directories.
//!
//! A benchmark base directory holds numbered run directories (`1/`, `2/`, ...).
//! Each run directory contains, per target, an activity-monitor telemetry file
//! and the load generator's console output:
//!
//! ```text
//! runs/
//!   1/
//!     strapi-activitymonitor-metrics.jsonp
//!     strapi-k6-results.txt
//!     graphcl-activitymonitor-metrics.jsonp
//!     graphcl-k6-results.txt
//!   2/
//!     ...
//! ```
//!
//! Every target's telemetry is filtered by source label and timestamp, capped
//! for outliers and summed; the load-test figures are read alongside.

use crate::error::{BenchmarkError, Result};
use crate::io;
use crate::load_test::parse_load_test;
use crate::result::{RunSummary, TargetSummary};
use crate::telemetry::{SampleSeries, SourceFilter, TelemetryFields};
use graphcl_parity_core::aggregate::OutlierAggregator;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default number of run directories scanned.
pub const DEFAULT_MAX_RUNS: usize = 10;

/// Where to find one target's artifacts inside a run directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Label used as column prefix.
    pub label: String,
    /// Telemetry file name.
    pub telemetry_file: PathBuf,
    /// Load-test output file name.
    pub load_test_file: PathBuf,
    /// Containers whose samples belong to this target.
    pub sources: SourceFilter,
}

impl TargetConfig {
    /// The reference deployment.
    pub fn baseline() -> Self {
        Self {
            label: "baseline".to_string(),
            telemetry_file: PathBuf::from("strapi-activitymonitor-metrics.jsonp"),
            load_test_file: PathBuf::from("strapi-k6-results.txt"),
            sources: SourceFilter::exact(["strapi_blog"]),
        }
    }

    /// The deployment under evaluation.
    pub fn candidate() -> Self {
        Self {
            label: "graphcl".to_string(),
            telemetry_file: PathBuf::from("graphcl-activitymonitor-metrics.jsonp"),
            load_test_file: PathBuf::from("graphcl-k6-results.txt"),
            sources: SourceFilter::prefixes(["strapi_", "strapi-graphcl"]),
        }
    }
}

/// Settings of the summary pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Baseline target.
    pub baseline: TargetConfig,
    /// Candidate target.
    pub candidate: TargetConfig,
    /// Highest run number scanned.
    pub max_runs: usize,
    /// Outlier capping applied to every energy series.
    pub aggregator: OutlierAggregator,
    /// Telemetry field names.
    pub fields: TelemetryFields,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            baseline: TargetConfig::baseline(),
            candidate: TargetConfig::candidate(),
            max_runs: DEFAULT_MAX_RUNS,
            aggregator: OutlierAggregator::default(),
            fields: TelemetryFields::default(),
        }
    }
}

/// Summarize one target of one run directory.
pub fn process_target(
    dir: &Path,
    target: &TargetConfig,
    config: &SummaryConfig,
) -> Result<TargetSummary> {
    let records = io::read_telemetry(dir.join(&target.telemetry_file), &config.fields)?;
    let series = SampleSeries::from_records(&target.label, &records, &target.sources);
    debug!(
        target = %target.label,
        samples = series.len(),
        span = series.span(),
        "Collected energy samples"
    );
    if series.len() < records.len() {
        info!(
            target = %target.label,
            kept = series.len(),
            dropped = records.len() - series.len(),
            "Filtered telemetry by source and timestamp"
        );
    }

    let cpu_energy = config
        .aggregator
        .aggregate(&series.values())
        .map_err(|source| BenchmarkError::Aggregation {
            target: target.label.clone(),
            source,
        })?;

    let load = parse_load_test(&io::read_text(dir.join(&target.load_test_file))?)?;

    Ok(TargetSummary::new(&load, cpu_energy))
}

/// Summarize both targets of one run directory.
pub fn process_run(dir: &Path, run: usize, config: &SummaryConfig) -> Result<RunSummary> {
    info!(run, dir = %dir.display(), "Processing run");
    let baseline = process_target(dir, &config.baseline, config)?;
    let candidate = process_target(dir, &config.candidate, config)?;
    Ok(RunSummary {
        run,
        baseline,
        candidate,
    })
}

/// Summarize `base/1` through `base/<max_runs>`, stopping at the first
/// missing run directory.
pub fn summarize_runs(base: &Path, config: &SummaryConfig) -> Result<Vec<RunSummary>> {
    let mut summaries = Vec::new();
    for run in 1..=config.max_runs {
        let dir = base.join(run.to_string());
        if !dir.is_dir() {
            break;
        }
        summaries.push(process_run(&dir, run, config)?);
    }

    if summaries.is_empty() {
        warn!(base = %base.display(), "No run directories found");
    } else {
        info!(runs = summaries.len(), "Summarized runs");
    }
    Ok(summaries)
}
