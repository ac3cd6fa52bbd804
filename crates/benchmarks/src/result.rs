//! Run summary types.
//!
//! A [`RunSummary`] is one row of the final report: load-test figures and the
//! aggregated CPU energy of the baseline and the candidate deployment for a
//! single benchmark run.

use crate::load_test::LoadTestMetrics;
use serde::{Deserialize, Serialize};

/// Per-target column suffixes, in report order.
pub const TARGET_COLUMNS: [&str; 5] = [
    "http_rate",
    "http_duration_mean",
    "http_duration_median",
    "http_duration_p95",
    "cpu_energy",
];

/// Figures of one target in one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    /// Requests per second.
    pub http_rate: f64,
    /// Mean request duration.
    pub http_duration_mean: f64,
    /// Median request duration.
    pub http_duration_median: f64,
    /// 95th percentile request duration.
    pub http_duration_p95: f64,
    /// Outlier-capped total CPU energy.
    pub cpu_energy: f64,
}

impl TargetSummary {
    /// Combine load-test metrics with an aggregated energy total.
    pub fn new(load: &LoadTestMetrics, cpu_energy: f64) -> Self {
        Self {
            http_rate: load.request_rate,
            http_duration_mean: load.duration_mean,
            http_duration_median: load.duration_median,
            http_duration_p95: load.duration_p95,
            cpu_energy,
        }
    }

    /// Values in [`TARGET_COLUMNS`] order.
    pub fn values(&self) -> [f64; 5] {
        [
            self.http_rate,
            self.http_duration_mean,
            self.http_duration_median,
            self.http_duration_p95,
            self.cpu_energy,
        ]
    }

    /// This target's energy relative to `baseline`; `None` when the baseline
    /// used no energy.
    pub fn energy_ratio(&self, baseline: &TargetSummary) -> Option<f64> {
        (baseline.cpu_energy != 0.0).then(|| self.cpu_energy / baseline.cpu_energy)
    }

    /// Field-wise mean of several summaries.
    pub fn mean<'a>(summaries: impl IntoIterator<Item = &'a TargetSummary>) -> Option<Self> {
        let mut totals = [0.0; 5];
        let mut count = 0usize;
        for summary in summaries {
            for (total, value) in totals.iter_mut().zip(summary.values()) {
                *total += value;
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let [http_rate, http_duration_mean, http_duration_median, http_duration_p95, cpu_energy] =
            totals.map(|total| total / count as f64);
        Some(Self {
            http_rate,
            http_duration_mean,
            http_duration_median,
            http_duration_p95,
            cpu_energy,
        })
    }
}

/// One report row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 1-based run number.
    pub run: usize,
    /// Baseline deployment figures.
    pub baseline: TargetSummary,
    /// Candidate deployment figures.
    pub candidate: TargetSummary,
}

impl RunSummary {
    /// Column names for the given target labels: the five baseline columns
    /// followed by the five candidate columns.
    pub fn columns(baseline_label: &str, candidate_label: &str) -> Vec<String> {
        [baseline_label, candidate_label]
            .iter()
            .flat_map(|label| {
                TARGET_COLUMNS
                    .iter()
                    .map(move |column| format!("{label}_{column}"))
            })
            .collect()
    }

    /// Row values in [`RunSummary::columns`] order.
    pub fn row(&self) -> Vec<f64> {
        self.baseline
            .values()
            .into_iter()
            .chain(self.candidate.values())
            .collect()
    }

    /// Candidate energy relative to baseline energy.
    pub fn energy_ratio(&self) -> Option<f64> {
        self.candidate.energy_ratio(&self.baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(rate: f64, energy: f64) -> TargetSummary {
        TargetSummary {
            http_rate: rate,
            http_duration_mean: 2.0,
            http_duration_median: 1.0,
            http_duration_p95: 5.0,
            cpu_energy: energy,
        }
    }

    #[test]
    fn test_columns_order() {
        let columns = RunSummary::columns("baseline", "graphcl");
        assert_eq!(columns.len(), 10);
        assert_eq!(columns[0], "baseline_http_rate");
        assert_eq!(columns[4], "baseline_cpu_energy");
        assert_eq!(columns[5], "graphcl_http_rate");
        assert_eq!(columns[9], "graphcl_cpu_energy");
    }

    #[test]
    fn test_row_matches_columns() {
        let summary = RunSummary {
            run: 1,
            baseline: target(10.0, 100.0),
            candidate: target(12.0, 80.0),
        };
        assert_eq!(
            summary.row(),
            vec![10.0, 2.0, 1.0, 5.0, 100.0, 12.0, 2.0, 1.0, 5.0, 80.0]
        );
        assert_eq!(summary.energy_ratio(), Some(0.8));
    }

    #[test]
    fn test_zero_baseline_energy_has_no_ratio() {
        let summary = RunSummary {
            run: 1,
            baseline: target(1.0, 0.0),
            candidate: target(1.0, 5.0),
        };
        assert_eq!(summary.energy_ratio(), None);
    }

    #[test]
    fn test_mean() {
        let a = target(10.0, 100.0);
        let b = target(20.0, 50.0);
        let mean = TargetSummary::mean([&a, &b]).unwrap();
        assert_eq!(mean.http_rate, 15.0);
        assert_eq!(mean.cpu_energy, 75.0);
        assert!(TargetSummary::mean(Vec::<TargetSummary>::new().iter()).is_none());
    }
}
