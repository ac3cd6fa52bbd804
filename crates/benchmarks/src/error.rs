//! Error types for the summary pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading run artifacts or writing reports.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A telemetry line is not valid JSON.
    #[error("Malformed telemetry record at {}:{line}: {source}", path.display())]
    MalformedRecord {
        /// Telemetry file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A load-test results marker is absent.
    #[error("Load test results marker not found: {0}")]
    MissingMarker(&'static str),

    /// A load-test metric is absent or not numeric.
    #[error("Missing load test metric: {0}")]
    MissingMetric(String),

    /// A target's telemetry could not be aggregated.
    #[error("Cannot aggregate telemetry for {target}: {source}")]
    Aggregation {
        /// Target label.
        target: String,
        /// Core error.
        #[source]
        source: graphcl_parity_core::Error,
    },

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BenchmarkError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BenchmarkError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchmarkError>;
