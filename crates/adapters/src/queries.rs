// Copyright 2025 GraphCL Parity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Query case files.
//!
//! A query file is a JSON array. Each entry is either a bare query string,
//! identified by its position, or a case object:
//!
//! ```json
//! [
//!   "{ posts { title } }",
//!   {"id": "get_users", "query": "query { users { name } }", "expected_fields": ["users"]}
//! ]
//! ```

use crate::client::GraphqlRequest;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default query file name.
pub const DEFAULT_QUERIES_FILE: &str = "queries.json";

/// Errors raised while loading or writing query files.
#[derive(Debug, Error)]
pub enum QueryError {
    /// File could not be read or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid query list
    #[error("Invalid query file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A named query sent to both deployments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCase {
    /// Case identifier, used in logs and sample file names.
    #[serde(default)]
    pub id: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Query document.
    pub query: String,
    /// Query variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    /// Top-level `data` fields both responses must contain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_fields: Option<Vec<String>>,
}

impl QueryCase {
    /// Case with an id and a query.
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            query: query.into(),
            variables: None,
            expected_fields: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the variables.
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Set the expected top-level fields.
    pub fn with_expected_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// The HTTP request body for this case.
    pub fn request(&self) -> GraphqlRequest {
        GraphqlRequest {
            query: self.query.clone(),
            variables: self.variables.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryEntry {
    Text(String),
    Case(QueryCase),
}

/// Parse a query list.
///
/// Bare strings get their index as id; case objects without an id fall back
/// to their description, then to their index.
pub fn parse_queries(text: &str) -> serde_json::Result<Vec<QueryCase>> {
    let entries: Vec<QueryEntry> = serde_json::from_str(text)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            QueryEntry::Text(query) => QueryCase::new(index.to_string(), query),
            QueryEntry::Case(mut case) => {
                if case.id.is_empty() {
                    case.id = if case.description.is_empty() {
                        index.to_string()
                    } else {
                        case.description.clone()
                    };
                }
                case
            }
        })
        .collect())
}

/// Load a query file.
pub fn load_queries(path: impl AsRef<Path>) -> Result<Vec<QueryCase>, QueryError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| QueryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_queries(&text).map_err(|source| QueryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Built-in example cases.
pub fn sample_queries() -> Vec<QueryCase> {
    vec![
        QueryCase::new(
            "get_users",
            "query GetUsers($limit: Int) {\n  users(limit: $limit) {\n    id\n    name\n    email\n    profile {\n      firstName\n      lastName\n    }\n  }\n}\n",
        )
        .with_description("Get users with profiles")
        .with_variables(json!({"limit": 10}))
        .with_expected_fields(["users"]),
        QueryCase::new(
            "get_posts",
            "query GetPosts {\n  posts {\n    title\n    content\n    author {\n      name\n    }\n    tags\n  }\n}\n",
        )
        .with_description("Get posts with authors")
        .with_expected_fields(["posts"]),
        QueryCase::new(
            "get_user_by_id",
            "query GetUserById($userId: ID!) {\n  user(id: $userId) {\n    id\n    name\n    email\n    posts {\n      title\n      createdAt\n    }\n  }\n}\n",
        )
        .with_description("Get specific user by ID")
        .with_variables(json!({"userId": "1"}))
        .with_expected_fields(["user"]),
    ]
}

/// Write [`sample_queries`] to `path` as pretty JSON.
pub fn write_sample_queries(path: impl AsRef<Path>) -> Result<(), QueryError> {
    let path = path.as_ref();
    let io_error = |source| QueryError::Io {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_string_pretty(&sample_queries()).map_err(|source| {
        QueryError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, json).map_err(io_error)
}
