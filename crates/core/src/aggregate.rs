// Copyright 2025 GraphCL Parity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Outlier-capped reduction of telemetry series.
//!
//! Energy and latency probes occasionally report isolated high spikes. The
//! aggregator computes the interquartile range of a series, clamps every
//! sample above `Q3 + multiplier * IQR` down to that bound, and sums the
//! result. Low values are never touched.
//!
//! Quantiles use linear interpolation between closest ranks
//! (`pos = (n - 1) * q`). Series shorter than four samples are accepted; their
//! bounds are simply degenerate (a single sample is its own bound).
//!
//! # Example
//!
//! ```
//! use graphcl_parity_core::aggregate::{cap_outliers, reduce_sum};
//!
//! let capped = cap_outliers(&[1.0, 2.0, 3.0, 4.0, 100.0], 1.5).unwrap();
//! assert_eq!(capped, vec![1.0, 2.0, 3.0, 4.0, 7.0]);
//! assert_eq!(reduce_sum(&capped).unwrap(), 17.0);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default IQR multiplier (Tukey's fence).
pub const DEFAULT_MULTIPLIER: f64 = 1.5;

/// Quartiles and the derived upper fence of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    /// First quartile.
    pub q1: f64,
    /// Third quartile.
    pub q3: f64,
    /// `q3 - q1`.
    pub iqr: f64,
    /// `q3 + multiplier * iqr`; samples above it are capped.
    pub upper: f64,
}

impl IqrBounds {
    /// Compute the bounds of `samples`.
    pub fn compute(samples: &[f64], multiplier: f64) -> Result<Self> {
        validate_multiplier(multiplier)?;
        let sorted = sorted_samples(samples)?;
        let q1 = quantile_sorted(&sorted, 0.25);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        Ok(Self {
            q1,
            q3,
            iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Clamp a single value to the upper bound.
    pub fn cap(&self, value: f64) -> f64 {
        if value > self.upper {
            self.upper
        } else {
            value
        }
    }
}

/// Configured outlier-capping reducer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierAggregator {
    /// IQR multiplier for the upper fence.
    pub multiplier: f64,
}

impl Default for OutlierAggregator {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl OutlierAggregator {
    /// Create an aggregator with a custom multiplier.
    pub fn with_multiplier(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// Bounds of `samples` under this aggregator's multiplier.
    pub fn bounds(&self, samples: &[f64]) -> Result<IqrBounds> {
        IqrBounds::compute(samples, self.multiplier)
    }

    /// Cap the outliers of `samples`.
    pub fn cap(&self, samples: &[f64]) -> Result<Vec<f64>> {
        let bounds = self.bounds(samples)?;
        Ok(samples.iter().map(|&value| bounds.cap(value)).collect())
    }

    /// Cap the outliers of `samples` and return their total.
    pub fn aggregate(&self, samples: &[f64]) -> Result<f64> {
        reduce_sum(&self.cap(samples)?)
    }
}

/// Quantile `q` (in `[0, 1]`) of `samples` by linear interpolation.
pub fn quantile(samples: &[f64], q: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(Error::invalid_input(format!(
            "quantile must be within [0, 1], got {q}"
        )));
    }
    let sorted = sorted_samples(samples)?;
    Ok(quantile_sorted(&sorted, q))
}

/// Replace every sample above `Q3 + multiplier * IQR` with that bound.
///
/// Output has the same length and order as the input; samples at or below
/// the bound are returned unchanged.
pub fn cap_outliers(samples: &[f64], multiplier: f64) -> Result<Vec<f64>> {
    let bounds = IqrBounds::compute(samples, multiplier)?;
    Ok(samples.iter().map(|&value| bounds.cap(value)).collect())
}

/// Total of a non-empty series.
///
/// Summation runs over the samples in ascending order, so the total does not
/// depend on the order of the input.
pub fn reduce_sum(samples: &[f64]) -> Result<f64> {
    let sorted = sorted_samples(samples)?;
    Ok(sorted.iter().sum())
}

fn validate_multiplier(multiplier: f64) -> Result<()> {
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(Error::invalid_input(format!(
            "outlier multiplier must be a finite non-negative number, got {multiplier}"
        )));
    }
    Ok(())
}

fn sorted_samples(samples: &[f64]) -> Result<Vec<f64>> {
    if samples.is_empty() {
        return Err(Error::empty_series("at least one sample is required"));
    }
    if let Some(position) = samples.iter().position(|value| !value.is_finite()) {
        return Err(Error::invalid_input(format!(
            "sample {position} is not finite: {}",
            samples[position]
        )));
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_single_spike() {
        let bounds = IqrBounds::compute(&[1.0, 2.0, 3.0, 4.0, 100.0], 1.5).unwrap();
        assert_eq!(bounds.q1, 2.0);
        assert_eq!(bounds.q3, 4.0);
        assert_eq!(bounds.iqr, 2.0);
        assert_eq!(bounds.upper, 7.0);

        let capped = cap_outliers(&[1.0, 2.0, 3.0, 4.0, 100.0], 1.5).unwrap();
        assert_eq!(capped, vec![1.0, 2.0, 3.0, 4.0, 7.0]);
        assert_eq!(reduce_sum(&capped).unwrap(), 17.0);
    }

    #[test]
    fn test_low_values_untouched() {
        let samples = [-100.0, 1.0, 2.0, 3.0, 4.0];
        let capped = cap_outliers(&samples, 1.5).unwrap();
        assert_eq!(capped, samples.to_vec());
    }

    #[test]
    fn test_interpolated_quantiles() {
        assert_eq!(quantile(&[1.0, 10.0], 0.25).unwrap(), 3.25);
        assert_eq!(quantile(&[1.0, 10.0], 0.75).unwrap(), 7.75);
        assert_eq!(quantile(&[4.0, 1.0, 3.0, 2.0], 0.5).unwrap(), 2.5);
        assert_eq!(quantile(&[5.0], 0.9).unwrap(), 5.0);
    }

    #[test]
    fn test_quantile_out_of_range() {
        assert!(matches!(quantile(&[1.0], 1.5), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_single_sample_is_its_own_bound() {
        let capped = cap_outliers(&[42.0], 1.5).unwrap();
        assert_eq!(capped, vec![42.0]);
    }

    #[test]
    fn test_empty_series_fails() {
        assert!(matches!(cap_outliers(&[], 1.5), Err(Error::EmptySeries(_))));
        assert!(matches!(reduce_sum(&[]), Err(Error::EmptySeries(_))));
        assert!(matches!(
            OutlierAggregator::default().aggregate(&[]),
            Err(Error::EmptySeries(_))
        ));
    }

    #[test]
    fn test_non_finite_samples_rejected() {
        let err = cap_outliers(&[1.0, f64::NAN], 1.5).unwrap_err();
        assert!(err.to_string().contains("sample 1"));
    }

    #[test]
    fn test_invalid_multiplier_rejected() {
        assert!(matches!(
            cap_outliers(&[1.0, 2.0], -1.0),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            cap_outliers(&[1.0, 2.0], f64::INFINITY),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_multiplier_caps_at_q3() {
        let capped = cap_outliers(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.0).unwrap();
        assert_eq!(capped, vec![1.0, 2.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn test_aggregator_defaults() {
        let aggregator = OutlierAggregator::default();
        assert_eq!(aggregator.multiplier, DEFAULT_MULTIPLIER);
        assert_eq!(
            aggregator.aggregate(&[100.0, 4.0, 3.0, 2.0, 1.0]).unwrap(),
            17.0
        );
    }

    #[test]
    fn test_custom_multiplier_widens_fence() {
        let aggregator = OutlierAggregator::with_multiplier(3.0);
        let bounds = aggregator.bounds(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(bounds.upper, 10.0);
        assert_eq!(
            aggregator.cap(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap(),
            vec![1.0, 2.0, 3.0, 4.0, 10.0]
        );
    }

    #[test]
    fn test_aggregator_deserializes_with_default() {
        let aggregator: OutlierAggregator = serde_json::from_str("{}").unwrap();
        assert_eq!(aggregator, OutlierAggregator::default());
        let aggregator: OutlierAggregator = serde_json::from_str(r#"{"multiplier": 3.0}"#).unwrap();
        assert_eq!(aggregator.multiplier, 3.0);
    }
}
