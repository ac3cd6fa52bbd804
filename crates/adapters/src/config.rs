// Copyright 2025 GraphCL Parity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parity run configuration.
//!
//! Deserializable with defaults for every field, so an empty configuration
//! source describes two local deployments and a `queries.json` file.

use crate::client::{ClientError, GraphqlEndpoint};
use crate::queries::DEFAULT_QUERIES_FILE;
use graphcl_parity_core::compare::SemanticComparator;
use graphcl_parity_core::normalize::IgnoreKeySet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the left deployment's base URL.
pub const LEFT_URL_VAR: &str = "GRAPHQL_API1";
/// Environment variable holding the right deployment's base URL.
pub const RIGHT_URL_VAR: &str = "GRAPHQL_API2";
/// Environment variable holding the query file path.
pub const QUERIES_FILE_VAR: &str = "QUERIES_FILE";

/// Key ignored on top of the normalizer defaults.
pub const TIMESTAMP_KEY: &str = "timestamp";

fn default_left() -> GraphqlEndpoint {
    GraphqlEndpoint::from_base_url("API_1", "http://localhost:1337")
}

fn default_right() -> GraphqlEndpoint {
    GraphqlEndpoint::from_base_url("API_2", "http://localhost:3000")
}

fn default_queries_file() -> PathBuf {
    PathBuf::from(DEFAULT_QUERIES_FILE)
}

fn default_ignore_keys() -> IgnoreKeySet {
    IgnoreKeySet::default().with(TIMESTAMP_KEY)
}

/// Settings for a parity run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParityConfig {
    /// Reference deployment.
    #[serde(default = "default_left")]
    pub left: GraphqlEndpoint,
    /// Deployment under test.
    #[serde(default = "default_right")]
    pub right: GraphqlEndpoint,
    /// Query case file.
    #[serde(default = "default_queries_file")]
    pub queries_file: PathBuf,
    /// Keys stripped before comparison.
    #[serde(default = "default_ignore_keys")]
    pub ignore_keys: IgnoreKeySet,
    /// Where to write sample outputs of equivalent cases, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_dir: Option<PathBuf>,
}

impl Default for ParityConfig {
    fn default() -> Self {
        Self {
            left: default_left(),
            right: default_right(),
            queries_file: default_queries_file(),
            ignore_keys: default_ignore_keys(),
            sample_dir: None,
        }
    }
}

impl ParityConfig {
    /// Comparator built from the configured ignore keys.
    pub fn comparator(&self) -> SemanticComparator {
        SemanticComparator::new(self.ignore_keys.clone())
    }

    /// Apply `GRAPHQL_API1`, `GRAPHQL_API2` and `QUERIES_FILE` from `lookup`.
    ///
    /// URL variables hold base URLs; `/graphql` is appended.
    pub fn apply_url_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(LEFT_URL_VAR) {
            self.left.url = GraphqlEndpoint::from_base_url(self.left.name.as_str(), &base).url;
        }
        if let Some(base) = lookup(RIGHT_URL_VAR) {
            self.right.url = GraphqlEndpoint::from_base_url(self.right.name.as_str(), &base).url;
        }
        if let Some(path) = lookup(QUERIES_FILE_VAR) {
            self.queries_file = PathBuf::from(path);
        }
    }

    /// Reject invalid endpoints and endpoints sharing a name.
    pub fn validate(&self) -> Result<(), ClientError> {
        self.left.validate()?;
        self.right.validate()?;
        if self.left.name == self.right.name {
            return Err(ClientError::InvalidConfig {
                endpoint: self.right.name.clone(),
                message: "both endpoints share the same name".to_string(),
            });
        }
        Ok(())
    }
}
