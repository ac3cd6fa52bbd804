//! Benchmark run summaries for GraphCL Parity.
//!
//! This crate turns the raw artifacts of repeated benchmark runs (container
//! energy telemetry and HTTP load-test output) into one summary row per run,
//! comparing a baseline deployment with a candidate deployment.
//!
//! # Quick Start
//!
//! ```no_run
//! use graphcl_parity_benchmarks::{io, summarize_runs, SummaryConfig};
//! use std::path::Path;
//!
//! let config = SummaryConfig::default();
//! let summaries = summarize_runs(Path::new("runs"), &config).unwrap();
//! io::write_summary_csv(&summaries, &config.baseline.label, &config.candidate.label, "summary.csv")
//!     .unwrap();
//! ```
//!
//! # Modules
//!
//! - [`telemetry`] - Telemetry records, source filters and sample series
//! - [`load_test`] - Load-test result extraction
//! - [`pipeline`] - Run directory processing
//! - [`result`] - The `RunSummary` row type
//! - [`io`] - Reading artifacts and writing reports
//! - [`table`] - CSV rendering
//! - [`markdown`] - Markdown report generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod io;
pub mod markdown;
pub mod pipeline;
pub mod result;
pub mod table;
pub mod telemetry;

pub use error::{BenchmarkError, Result};
pub use load_test::{parse_load_test, LoadTestMetrics};
pub use pipeline::{process_run, summarize_runs, SummaryConfig, TargetConfig};
pub use result::{RunSummary, TargetSummary};
pub use telemetry::{SampleSeries, SourceFilter, TelemetryFields, TelemetryRecord};
