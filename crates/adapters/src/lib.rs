// Copyright 2025 GraphCL Parity Contributors
// SPDX-License-Identifier: Apache-2.0

//! GraphQL clients and the differential parity harness.
//!
//! # Modules
//!
//! - [`client`] - Endpoint configuration and the reqwest transport
//! - [`queries`] - Query case files
//! - [`harness`] - Runs cases against two deployments and compares them
//! - [`config`] - Parity run configuration

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod harness;
pub mod queries;

pub use client::{
    ClientError, GraphqlEndpoint, GraphqlRequest, GraphqlResponse, GraphqlTransport,
    HttpGraphqlClient,
};
pub use config::ParityConfig;
pub use harness::{
    CaseOutcome, CaseStatus, ParityHarness, ParityReport, SchemaCompatibility, SchemaError,
};
pub use queries::{load_queries, sample_queries, write_sample_queries, QueryCase, QueryError};
