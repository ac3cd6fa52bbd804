// Copyright 2025 GraphCL Parity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core algorithms for GraphCL Parity.
//!
//! Two small, pure building blocks shared by the parity harness and the
//! benchmark summary pipeline:
//!
//! - [`normalize`] and [`compare`]: strip volatile keys from GraphQL
//!   responses and decide whether two responses carry the same data,
//!   ignoring key order and array order.
//! - [`aggregate`]: cap upward outliers at an IQR-derived bound and reduce
//!   a telemetry series to a single total.
//!
//! Nothing in this crate performs I/O or holds global state; every default
//! is an explicit value that callers may override.
//!
//! # Example
//!
//! ```
//! use graphcl_parity_core::compare::SemanticComparator;
//! use serde_json::json;
//!
//! let comparator = SemanticComparator::default();
//! let left = json!({"user": {"id": "1", "name": "Al"}});
//! let right = json!({"user": {"id": "2", "name": "Al"}});
//! assert!(comparator.are_equal(&left, &right));
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod compare;
pub mod normalize;

pub use aggregate::{cap_outliers, reduce_sum, IqrBounds, OutlierAggregator};
pub use compare::{ComparisonResult, Diff, DiffChange, DiffEntry, SemanticComparator};
pub use normalize::{normalize, IgnoreKeySet};

use thiserror::Error;

/// Errors raised by the core algorithms.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A reduction was asked to operate on a series with no samples.
    #[error("Empty sample series: {0}")]
    EmptySeries(String),

    /// An argument was outside its accepted domain.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Build an [`Error::EmptySeries`].
    pub fn empty_series(context: impl Into<String>) -> Self {
        Error::EmptySeries(context.into())
    }

    /// Build an [`Error::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
